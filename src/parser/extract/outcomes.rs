use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Diagnostics, ParseWarning};
use crate::model::{Outcome, OutcomeCategory, ProgramOutcome};
use crate::parser::blocks::Block;
use crate::parser::sections::{find_section, Section, SectionKind};

/// Outcome sections are split by these school names, in this order of preference
/// when a line mentions more than one.
pub const SCHOOLS: [&str; 4] = [
    "School of Business",
    "School of Technology",
    "School of Health",
    "School of Education",
];

const CATEGORY_KEYWORDS: &[(OutcomeCategory, &[&str])] = &[
    (
        OutcomeCategory::Technical,
        &["technical", "technology", "software", "data", "system", "programming", "network", "security", "clinical"],
    ),
    (
        OutcomeCategory::Professional,
        &["professional", "ethic", "communicat", "leadership", "collaborat", "team"],
    ),
    (
        OutcomeCategory::Analytical,
        &["analy", "critical", "evaluat", "research", "problem", "assess"],
    ),
];

/// Bullet outcomes keyed `{school}_{program}`.
pub fn extract(sections: &[Section], diag: &mut Diagnostics) -> BTreeMap<String, ProgramOutcome> {
    let mut out: BTreeMap<String, ProgramOutcome> = BTreeMap::new();
    let Some(section) = find_section(sections, SectionKind::ProgramOutcomes) else {
        diag.push(ParseWarning::missing(SectionKind::ProgramOutcomes.title()));
        return out;
    };

    let mut school: Option<&'static str> = None;
    let mut program: Option<String> = None;

    for (block, line) in section.entries() {
        match block {
            Block::DegreeTitle { name, .. } => {
                program = Some(name.clone());
            }
            Block::Bullet(text) => {
                let (Some(school), Some(program)) = (school, program.as_ref()) else {
                    debug!("outcome outside a school/program block: {}", text);
                    continue;
                };
                let key = format!("{}_{}", school, program);
                out.entry(key)
                    .or_insert_with(|| ProgramOutcome {
                        school: school.to_string(),
                        program: program.clone(),
                        outcomes: Vec::new(),
                    })
                    .outcomes
                    .push(Outcome {
                        outcome: text.clone(),
                        category: categorize(text),
                    });
            }
            _ => {
                if let Some(found) = school_in(line) {
                    school = Some(found);
                    program = None;
                }
            }
        }
    }

    debug!("program outcomes: {} programs", out.len());
    out
}

fn school_in(line: &str) -> Option<&'static str> {
    if line.len() > 120 {
        return None;
    }
    SCHOOLS.iter().copied().find(|s| line.contains(s))
}

pub fn categorize(outcome: &str) -> Option<OutcomeCategory> {
    let lower = outcome.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
}
