use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::ccn::CcnMap;
use super::classify::CourseClassifier;
use super::descriptions::DescriptionMap;
use super::units::{valid_units, UnitMap};
use super::{course_codes_in, normalize_whitespace};
use crate::error::{Diagnostics, ParseWarning};
use crate::model::Course;
use crate::parser::format::{CatalogFormat, ExtractionStrategy};
use crate::parser::{CCN_PATTERN, CODE_PATTERN};

// CODE - Name (N credits) [CCN]
static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*({CODE_PATTERN}) - (.+?) \((\d{{1,3}}) (?:credits?|CUs?)\)(?:[ \t]*\[?({CCN_PATTERN})\]?)?[ \t]*$"
    ))
    .unwrap()
});

// CODE - Name - Description
static PRIMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*({CODE_PATTERN}) - (.+?) - ([^\n]+?)[ \t]*$")).unwrap()
});

// CODENameNN: whitespace collapsed, name runs straight into CU digit(s) and term digit.
// No suffix letter on the code here, it would swallow the first letter of the name.
static CONCATENATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Z]{1,4}\d{2,4})([A-Za-z][A-Za-z ,&:'/()\-]*?[A-Za-z)])(\d{1,2})(\d)[ \t]*$").unwrap()
});

static PREREQ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bprerequisites?\s*:\s*([^.;]+)").unwrap());
static COREQ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcorequisites?\s*:\s*([^.;]+)").unwrap());

/// Names known to lose their first letter in text extraction.
pub fn default_truncation_fixes() -> Vec<(String, String)> {
    [
        ("ublic Health", "Public Health"),
        ("ntroduction", "Introduction"),
        ("nformation", "Information"),
        ("usiness", "Business"),
        ("ursing", "Nursing"),
        ("ealth", "Health"),
        ("athematics", "Mathematics"),
        ("ccounting", "Accounting"),
        ("anagement", "Management"),
        ("undamentals", "Fundamentals"),
        ("pplied", "Applied"),
        ("dvanced", "Advanced"),
    ]
    .into_iter()
    .map(|(broken, fixed)| (broken.to_string(), fixed.to_string()))
    .collect()
}

/// Inputs built by the mapping extractors, read-only here.
pub struct CourseLookups<'a> {
    pub ccn: &'a CcnMap,
    pub units: &'a UnitMap,
    pub descriptions: &'a DescriptionMap,
}

#[derive(Debug, Clone, PartialEq)]
struct RawCourse {
    code: String,
    name: String,
    description: Option<String>,
    ccn: Option<String>,
    units: Option<u8>,
}

#[derive(Debug, Default)]
pub struct CourseExtraction {
    pub courses: BTreeMap<String, Course>,
    /// Matches, counted before collapsing into the map.
    pub records: usize,
}

impl CourseExtraction {
    pub fn duplicates(&self) -> usize {
        self.records.saturating_sub(self.courses.len())
    }
}

pub struct CourseExtractor {
    truncation_fixes: Vec<(String, String)>,
}

impl Default for CourseExtractor {
    fn default() -> Self {
        CourseExtractor::new(default_truncation_fixes())
    }
}

impl CourseExtractor {
    pub fn new(truncation_fixes: Vec<(String, String)>) -> Self {
        CourseExtractor { truncation_fixes }
    }

    pub fn extract(
        &self,
        text: &str,
        format: &CatalogFormat,
        lookups: &CourseLookups<'_>,
        classifier: &dyn CourseClassifier,
        diag: &mut Diagnostics,
    ) -> CourseExtraction {
        let raw = match format.strategy {
            ExtractionStrategy::InlineCcn => legacy_pass(text, diag),
            ExtractionStrategy::PrimaryAndConcatenated => {
                // Secondary matches are appended as-is; a code seen by both
                // passes ends up with the concatenated record.
                let mut records = primary_pass(text);
                records.extend(self.concatenated_pass(text, diag));
                records
            }
        };
        debug!("{} course records ({:?})", raw.len(), format.strategy);

        let records = raw.len();
        let mut courses = BTreeMap::new();
        for course in raw {
            let course = enrich(course, lookups, classifier);
            courses.insert(course.code.clone(), course);
        }
        link_alternate_versions(&mut courses);

        CourseExtraction { courses, records }
    }

    fn concatenated_pass(&self, text: &str, diag: &mut Diagnostics) -> Vec<RawCourse> {
        CONCATENATED_RE
            .captures_iter(text)
            .map(|caps| RawCourse {
                code: caps[1].to_string(),
                name: self.repair_name(caps[2].trim()),
                description: None,
                ccn: None,
                units: checked_units(&caps[1], &caps[3], diag),
            })
            .collect()
    }

    /// Restore a dropped first letter using the fix table.
    pub fn repair_name(&self, name: &str) -> String {
        self.truncation_fixes
            .iter()
            .find(|(broken, _)| name.starts_with(broken.as_str()))
            .map(|(broken, fixed)| format!("{}{}", fixed, &name[broken.len()..]))
            .unwrap_or_else(|| name.to_string())
    }
}

fn legacy_pass(text: &str, diag: &mut Diagnostics) -> Vec<RawCourse> {
    LEGACY_RE
        .captures_iter(text)
        .map(|caps| RawCourse {
            code: caps[1].to_string(),
            name: normalize_whitespace(&caps[2]),
            description: None,
            ccn: caps.get(4).map(|m| m.as_str().to_string()),
            units: checked_units(&caps[1], &caps[3], diag),
        })
        .collect()
}

fn primary_pass(text: &str) -> Vec<RawCourse> {
    PRIMARY_RE
        .captures_iter(text)
        .map(|caps| RawCourse {
            code: caps[1].to_string(),
            name: normalize_whitespace(&caps[2]),
            description: Some(normalize_whitespace(&caps[3])).filter(|d| !d.is_empty()),
            ccn: None,
            units: None,
        })
        .collect()
}

fn checked_units(code: &str, raw: &str, diag: &mut Diagnostics) -> Option<u8> {
    let units = valid_units(raw);
    if units.is_none() {
        diag.push(ParseWarning::malformed("competency units", format!("{} {}", code, raw)));
    }
    units
}

/// Detailed description wins over the inline one; inline is used only when
/// no detailed entry exists.
fn choose_description(inline: Option<String>, detailed: Option<&String>) -> Option<String> {
    match detailed {
        Some(d) => Some(d.clone()),
        None => inline,
    }
}

fn enrich(raw: RawCourse, lookups: &CourseLookups<'_>, classifier: &dyn CourseClassifier) -> Course {
    let ccn = raw.ccn.or_else(|| lookups.ccn.get(&raw.code).cloned());
    let competency_units = raw.units.or_else(|| lookups.units.get(&raw.code).copied());
    let description = choose_description(raw.description, lookups.descriptions.get(&raw.code));

    let (prerequisites, corequisites) = match description.as_deref() {
        Some(d) => (
            referenced_codes(&PREREQ_RE, d, &raw.code),
            referenced_codes(&COREQ_RE, d, &raw.code),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let course_type = classifier.classify(
        &raw.code,
        Some(raw.name.as_str()),
        ccn.as_deref(),
        description.as_deref(),
    );

    Course {
        code: raw.code,
        name: raw.name,
        description,
        ccn,
        competency_units,
        course_type: Some(course_type),
        prerequisites,
        corequisites,
        alternate_versions: Vec::new(),
    }
}

fn referenced_codes(re: &Regex, description: &str, own_code: &str) -> Vec<String> {
    re.captures(description)
        .map(|caps| {
            course_codes_in(&caps[1])
                .into_iter()
                .filter(|c| c != own_code)
                .collect()
        })
        .unwrap_or_default()
}

/// `C182` and `C182A` share a stem.
fn code_stem(code: &str) -> &str {
    let bytes = code.as_bytes();
    match bytes {
        [.., d, l] if d.is_ascii_digit() && l.is_ascii_alphabetic() => &code[..code.len() - 1],
        _ => code,
    }
}

fn link_alternate_versions(courses: &mut BTreeMap<String, Course>) {
    let mut by_stem: HashMap<String, Vec<String>> = HashMap::new();
    for code in courses.keys() {
        by_stem
            .entry(code_stem(code).to_string())
            .or_default()
            .push(code.clone());
    }

    for course in courses.values_mut() {
        if let Some(group) = by_stem.get(code_stem(&course.code)) {
            course.alternate_versions = group.iter().filter(|c| **c != course.code).cloned().collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseType;
    use crate::parser::extract::classify::KeywordClassifier;
    use crate::parser::format::{default_registry, FormatVersion};

    fn format(version: FormatVersion) -> CatalogFormat {
        default_registry()
            .into_iter()
            .find(|f| f.version == version)
            .unwrap()
    }

    fn run(
        text: &str,
        version: FormatVersion,
        ccn: &CcnMap,
        units: &UnitMap,
        descriptions: &DescriptionMap,
    ) -> (CourseExtraction, Diagnostics) {
        let mut diag = Diagnostics::default();
        let lookups = CourseLookups { ccn, units, descriptions };
        let out = CourseExtractor::default().extract(text, &format(version), &lookups, &KeywordClassifier, &mut diag);
        (out, diag)
    }

    fn empty_run(text: &str, version: FormatVersion) -> CourseExtraction {
        run(text, version, &CcnMap::new(), &UnitMap::new(), &DescriptionMap::new()).0
    }

    #[test]
    fn legacy_lines_are_self_contained() {
        let text = "\
C182 - Introduction to IT (3 CUs) [ITEC 1010]
C278 - College Algebra (4 credits) MATH 1010
C455 - English Composition I (3 CUs)
Some paragraph that mentions C182 - nothing (abc)
";
        let out = empty_run(text, FormatVersion::Legacy);
        assert_eq!(out.courses.len(), 3);
        let c182 = &out.courses["C182"];
        assert_eq!(c182.name, "Introduction to IT");
        assert_eq!(c182.competency_units, Some(3));
        assert_eq!(c182.ccn.as_deref(), Some("ITEC 1010"));
        let c278 = &out.courses["C278"];
        assert_eq!(c278.ccn.as_deref(), Some("MATH 1010"));
        assert_eq!(c278.course_type, Some(CourseType::GeneralEducation));
        assert_eq!(out.courses["C455"].ccn, None);
    }

    #[test]
    fn legacy_out_of_range_units_dropped() {
        let (out, diag) = run(
            "C999 - Huge Course (40 CUs) ITEC 1010",
            FormatVersion::Legacy,
            &CcnMap::new(),
            &UnitMap::new(),
            &DescriptionMap::new(),
        );
        assert_eq!(out.courses["C999"].competency_units, None);
        assert_eq!(diag.discarded(), 1);
    }

    #[test]
    fn primary_pattern_backfilled_from_maps() {
        let ccn = CcnMap::from([("C182".to_string(), "ITEC 1010".to_string())]);
        let units = UnitMap::from([("C182".to_string(), 3)]);
        let (out, _) = run(
            "C182 - Intro to IT - Short desc",
            FormatVersion::Modern,
            &ccn,
            &units,
            &DescriptionMap::new(),
        );
        let c = &out.courses["C182"];
        assert_eq!(c.name, "Intro to IT");
        assert_eq!(c.ccn.as_deref(), Some("ITEC 1010"));
        assert_eq!(c.competency_units, Some(3));
        assert_eq!(c.description.as_deref(), Some("Short desc"));
    }

    #[test]
    fn detailed_description_preferred() {
        let long_inline = "An inline description that is comfortably longer than fifty characters.";
        let descriptions = DescriptionMap::from([(
            "C182".to_string(),
            "Detailed description from the Course Descriptions section.".to_string(),
        )]);
        let text = format!("C182 - Intro to IT - {}\nD280 - JavaScript - {}", long_inline, long_inline);
        let (out, _) = run(&text, FormatVersion::Modern, &CcnMap::new(), &UnitMap::new(), &descriptions);
        assert_eq!(
            out.courses["C182"].description.as_deref(),
            Some("Detailed description from the Course Descriptions section.")
        );
        assert_eq!(out.courses["D280"].description.as_deref(), Some(long_inline));
    }

    #[test]
    fn concatenated_records_repaired() {
        let text = "D123ublic Health Foundations31\nC950Data Structures and Algorithms II41\nD199Calculus I121";
        let out = empty_run(text, FormatVersion::Enhanced);
        assert_eq!(out.courses["D123"].name, "Public Health Foundations");
        assert_eq!(out.courses["D123"].competency_units, Some(3));
        assert_eq!(out.courses["C950"].name, "Data Structures and Algorithms II");
        assert_eq!(out.courses["C950"].competency_units, Some(4));
        assert_eq!(out.courses["D199"].competency_units, Some(12));
    }

    #[test]
    fn both_passes_append_without_dedup() {
        let text = "C182 - Intro to IT - Short desc\nC182Introduction to IT31";
        let out = empty_run(text, FormatVersion::Modern);
        assert_eq!(out.records, 2);
        assert_eq!(out.duplicates(), 1);
        // concatenated record comes last and replaces the primary one
        assert_eq!(out.courses["C182"].name, "Introduction to IT");
        assert_eq!(out.courses["C182"].description, None);
    }

    #[test]
    fn legacy_strategy_ignores_modern_lines() {
        let out = empty_run("C182 - Intro to IT - Short desc", FormatVersion::Legacy);
        assert!(out.courses.is_empty());
    }

    #[test]
    fn prerequisites_and_alternates() {
        let text = "\
C200 - Networks - Builds on earlier work. Prerequisites: C182, C100 and D280. Corequisite: C201.
C201 - Networks Lab - Hands-on practice for network design.
C201A - Networks Lab - Older hands-on practice for network design.";
        let out = empty_run(text, FormatVersion::Modern);
        let c200 = &out.courses["C200"];
        assert_eq!(c200.prerequisites, vec!["C182", "C100", "D280"]);
        assert_eq!(c200.corequisites, vec!["C201"]);
        assert_eq!(out.courses["C201"].alternate_versions, vec!["C201A"]);
        assert_eq!(out.courses["C201A"].alternate_versions, vec!["C201"]);
        assert!(c200.alternate_versions.is_empty());
    }

    #[test]
    fn repair_name_leaves_good_names() {
        let ex = CourseExtractor::default();
        assert_eq!(ex.repair_name("ntroduction to Spreadsheets"), "Introduction to Spreadsheets");
        assert_eq!(ex.repair_name("Introduction to IT"), "Introduction to IT");
    }
}
