use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::units::valid_units;
use super::{normalize_whitespace, parse_price, push_unique};
use crate::error::{Diagnostics, ParseWarning};
use crate::model::{CourseBundleInfo, PriceRange, StandaloneCourse};
use crate::parser::blocks::Block;
use crate::parser::sections::{find_section, Section, SectionKind};
use crate::parser::CODE_PATTERN;

static STANDALONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({CODE_PATTERN})\s*[-–—:]?\s*(.+?)\s*[-–—:]?\s*\$\s?([\d,]+(?:\.\d{{2}})?)(?:\s*\((\d{{1,2}})\s*(?:CUs?|competency units)\))?"
    ))
    .unwrap()
});
static INLINE_UNITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((\d{1,2})\s*(?:CUs?|competency units)\)\s*").unwrap());
static PRICE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?([\d,]+(?:\.\d{2})?)\s*(?:-|–|—|to)\s*\$\s?([\d,]+(?:\.\d{2})?)").unwrap()
});
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})[- ]?(month|week|day|year)s?\b").unwrap());
static ACCESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(unlimited access|all[- ]access|self[- ]paced)\b").unwrap());

pub struct StandaloneExtraction {
    pub courses: BTreeMap<String, StandaloneCourse>,
    pub bundles: Vec<CourseBundleInfo>,
}

/// Standalone courses and the bundle offers announced above them. Each course
/// found after a bundle sentence joins that bundle.
pub fn extract(sections: &[Section], diag: &mut Diagnostics) -> StandaloneExtraction {
    let mut out = StandaloneExtraction {
        courses: BTreeMap::new(),
        bundles: Vec::new(),
    };
    let Some(section) = find_section(sections, SectionKind::StandaloneCourses) else {
        diag.push(ParseWarning::missing(SectionKind::StandaloneCourses.title()));
        return out;
    };

    let mut current: Option<(StandaloneCourse, Vec<String>)> = None;

    for (block, line) in section.entries() {
        match block {
            Block::CourseRow { .. } => {
                finish(&mut out.courses, current.take());
                match parse_course(line) {
                    Some(course) => {
                        if let Some(bundle) = out.bundles.last_mut() {
                            push_unique(&mut bundle.courses, &course.code);
                        }
                        current = Some((course, Vec::new()));
                    }
                    None => diag.push(ParseWarning::malformed("standalone course", line)),
                }
            }
            Block::Empty | Block::Artifact => {}
            _ => {
                if let Some(bundle) = parse_bundle(line) {
                    finish(&mut out.courses, current.take());
                    out.bundles.push(bundle);
                } else if let Some((_, parts)) = current.as_mut() {
                    parts.push(line.to_string());
                }
            }
        }
    }
    finish(&mut out.courses, current.take());

    debug!(
        "standalone: {} courses, {} bundles",
        out.courses.len(),
        out.bundles.len()
    );
    out
}

fn finish(courses: &mut BTreeMap<String, StandaloneCourse>, entry: Option<(StandaloneCourse, Vec<String>)>) {
    if let Some((mut course, parts)) = entry {
        let description = normalize_whitespace(&parts.join(" "));
        if !description.is_empty() {
            course.description = Some(description);
        }
        courses.insert(course.code.clone(), course);
    }
}

fn parse_course(line: &str) -> Option<StandaloneCourse> {
    let caps = STANDALONE_RE.captures(line)?;
    let price = parse_price(&caps[3])?;
    let mut name = caps[2].trim().to_string();
    let mut competency_units = caps.get(4).and_then(|m| valid_units(m.as_str()));

    if let Some(inner) = INLINE_UNITS_RE.captures(&name) {
        if competency_units.is_none() {
            competency_units = valid_units(&inner[1]);
        }
        name = INLINE_UNITS_RE.replace(&name, " ").trim().to_string();
    }

    Some(StandaloneCourse {
        code: caps[1].to_string(),
        name: name.trim_end_matches(['-', '–', '—', ':']).trim().to_string(),
        description: None,
        price,
        competency_units,
    })
}

fn parse_bundle(line: &str) -> Option<CourseBundleInfo> {
    let caps = PRICE_RANGE_RE.captures(line)?;
    let price_range = match (parse_price(&caps[1]), parse_price(&caps[2])) {
        (Some(min), Some(max)) => Some(PriceRange { min, max }),
        _ => None,
    };

    let duration = DURATION_RE.captures(line).map(|c| {
        let n: u32 = c[1].parse().unwrap_or(1);
        let unit = c[2].to_lowercase();
        if n == 1 {
            format!("{} {}", n, unit)
        } else {
            format!("{} {}s", n, unit)
        }
    });
    let access_type = ACCESS_RE
        .captures(line)
        .map(|c| c[1].to_lowercase().replace(' ', "-"));

    Some(CourseBundleInfo {
        courses: Vec::new(),
        price_range,
        duration,
        access_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::classify_lines;
    use crate::parser::sections::cluster_sections;

    fn standalone(text: &str) -> (StandaloneExtraction, Diagnostics) {
        let lines: Vec<&str> = text.lines().collect();
        let blocks = classify_lines(text);
        let sections = cluster_sections(&lines, &blocks);
        let mut diag = Diagnostics::default();
        let out = extract(&sections, &mut diag);
        (out, diag)
    }

    #[test]
    fn courses_with_bundle() {
        let text = "\
Standalone Courses
Learners may enroll in a 6-month term with unlimited access to courses for $1,200 - $1,800.
C182 - Introduction to IT - $199 (3 CUs)
Explores the foundations of information technology.
D280 – JavaScript Programming – $249.00
C100 Quick Course (2 CUs) $99";
        let (out, _) = standalone(text);
        assert_eq!(out.courses.len(), 3);

        let c182 = &out.courses["C182"];
        assert_eq!(c182.name, "Introduction to IT");
        assert_eq!(c182.price, 199.0);
        assert_eq!(c182.competency_units, Some(3));
        assert_eq!(
            c182.description.as_deref(),
            Some("Explores the foundations of information technology.")
        );

        let d280 = &out.courses["D280"];
        assert_eq!(d280.name, "JavaScript Programming");
        assert_eq!(d280.price, 249.0);
        assert_eq!(d280.competency_units, None);

        let c100 = &out.courses["C100"];
        assert_eq!(c100.name, "Quick Course");
        assert_eq!(c100.competency_units, Some(2));

        assert_eq!(out.bundles.len(), 1);
        let bundle = &out.bundles[0];
        assert_eq!(bundle.courses, vec!["C182", "D280", "C100"]);
        assert_eq!(bundle.price_range, Some(PriceRange { min: 1200.0, max: 1800.0 }));
        assert_eq!(bundle.duration.as_deref(), Some("6 months"));
        assert_eq!(bundle.access_type.as_deref(), Some("unlimited-access"));
    }

    #[test]
    fn no_bundle_sentence() {
        let (out, _) = standalone("Standalone Courses\nC182 - Introduction to IT - $199");
        assert_eq!(out.courses.len(), 1);
        assert!(out.bundles.is_empty());
    }

    #[test]
    fn rows_without_price_discarded() {
        let (out, diag) = standalone("Standalone Courses\nC182 - Introduction to IT\nD280 - JavaScript - $10");
        assert_eq!(out.courses.keys().collect::<Vec<_>>(), vec!["D280"]);
        assert_eq!(diag.discarded(), 1);
    }

    #[test]
    fn missing_section() {
        let (out, diag) = standalone("Course Descriptions\nC182 - A - B");
        assert!(out.courses.is_empty());
        assert_eq!(diag.warnings().len(), 1);
    }
}
