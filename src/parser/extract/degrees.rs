use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::push_unique;
use crate::model::DegreePlan;
use crate::parser::blocks::Block;
use crate::parser::sections::{Section, SectionKind};
use crate::parser::CODE_PATTERN;

static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btotal\s*:?\s*(\d{1,3})\s*(?:CUs?|competency units)\b").unwrap());
static REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:CUs?|competency units)\s+(?:are\s+)?required\b").unwrap());
static TABULAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b({CODE_PATTERN})\s+\d{{1,2}}\s+[A-Z]")).unwrap());
// `D123ublic Health Foundations31`: code glued to the name, CU and term digits at the end.
static CONCATENATED_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,4}\d{2,4})[A-Za-z][^\n]*\d$").unwrap());

/// Checked in order; the first school whose keywords hit wins.
const SCHOOL_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "School of Technology",
        &[
            "information technology", "computer science", "cybersecurity", "software",
            "data analytics", "network", "cloud", "technology",
        ],
    ),
    (
        "School of Business",
        &["business", "accounting", "management", "marketing", "finance", "mba"],
    ),
    (
        "School of Health",
        &["nursing", "health", "healthcare", "psychology"],
    ),
    (
        "School of Education",
        &["education", "teaching", "teacher", "curriculum", "instructional"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `Bachelor of …` title followed by prose or `CODE CUs Name` rows.
    FreeText,
    /// `Program: …` followed by a CCN table.
    Table,
}

struct PlanBlock {
    origin: Origin,
    name: String,
    code: Option<String>,
    blocks: Vec<Block>,
    lines: Vec<String>,
}

/// Run both degree-plan strategies over every section except Program Outcomes,
/// then merge plans that share a normalized name.
pub fn extract(sections: &[Section]) -> Vec<DegreePlan> {
    let mut plans = Vec::new();

    for origin in [Origin::FreeText, Origin::Table] {
        for section in sections.iter().filter(|s| s.kind != SectionKind::ProgramOutcomes) {
            for block in plan_blocks(section, origin) {
                if let Some(plan) = build_plan(block) {
                    plans.push(plan);
                }
            }
        }
    }

    let found = plans.len();
    let plans = dedup_plans(plans);
    debug!("degree plans: {} blocks, {} after merge", found, plans.len());
    plans
}

fn plan_blocks(section: &Section, origin: Origin) -> Vec<PlanBlock> {
    let mut out = Vec::new();
    let mut current: Option<PlanBlock> = None;

    for (block, line) in section.entries() {
        let start = match (origin, block) {
            (Origin::FreeText, Block::DegreeTitle { name, code }) => Some((name.clone(), code.clone())),
            (Origin::Table, Block::ProgramHeader(name)) => Some((name.clone(), None)),
            _ => None,
        };

        if let Some((name, code)) = start {
            out.extend(current.take());
            current = Some(PlanBlock {
                origin,
                name,
                code,
                blocks: Vec::new(),
                lines: Vec::new(),
            });
            continue;
        }

        // Either kind of plan header closes the open block.
        if matches!(block, Block::DegreeTitle { .. } | Block::ProgramHeader(_)) {
            out.extend(current.take());
            continue;
        }

        if let Some(plan) = current.as_mut() {
            plan.blocks.push(block.clone());
            plan.lines.push(line.to_string());
        }
    }
    out.extend(current.take());
    out
}

fn build_plan(block: PlanBlock) -> Option<DegreePlan> {
    let mut courses = Vec::new();

    match block.origin {
        Origin::FreeText => {
            for (b, line) in block.blocks.iter().zip(&block.lines) {
                match b {
                    Block::CourseRow { code, .. } => push_unique(&mut courses, code),
                    Block::Text(text) => {
                        if let Some(caps) = CONCATENATED_ROW_RE.captures(text) {
                            push_unique(&mut courses, &caps[1]);
                        }
                    }
                    _ => {}
                }
                for caps in TABULAR_RE.captures_iter(line) {
                    push_unique(&mut courses, &caps[1]);
                }
            }
        }
        Origin::Table => {
            for b in &block.blocks {
                if let Block::CcnRow { code, .. } = b {
                    push_unique(&mut courses, code);
                }
            }
        }
    }

    let body = block.lines.join("\n");
    let total_cus = total_units(&body);

    if courses.is_empty() && total_cus.is_none() {
        debug!("skipping degree title without courses: {}", block.name);
        return None;
    }

    let school = infer_school(&block.name).or_else(|| infer_school(&body));

    Some(DegreePlan {
        name: block.name,
        code: block.code,
        school,
        courses,
        total_cus,
    })
}

/// `Total: 120 CUs` or `120 CUs required`.
pub fn total_units(text: &str) -> Option<u32> {
    TOTAL_RE
        .captures(text)
        .or_else(|| REQUIRED_RE.captures(text))
        .and_then(|c| c[1].parse().ok())
}

pub fn infer_school(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    SCHOOL_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(school, _)| school.to_string())
}

pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep the variant with more courses; borrow the total from the other one if missing.
pub fn dedup_plans(plans: Vec<DegreePlan>) -> Vec<DegreePlan> {
    let mut merged: Vec<DegreePlan> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for plan in plans {
        let key = normalize_name(&plan.name);
        let i = match index.get(&key).copied() {
            Some(i) => i,
            None => {
                index.insert(key, merged.len());
                merged.push(plan);
                continue;
            }
        };

        let existing = &mut merged[i];
        if plan.courses.len() > existing.courses.len() {
            let other = std::mem::replace(existing, plan);
            fill_missing(existing, other);
        } else {
            fill_missing(existing, plan);
        }
    }

    merged
}

fn fill_missing(kept: &mut DegreePlan, other: DegreePlan) {
    if kept.total_cus.is_none() {
        kept.total_cus = other.total_cus;
    }
    if kept.code.is_none() {
        kept.code = other.code;
    }
    if kept.school.is_none() {
        kept.school = other.school;
    }
}
