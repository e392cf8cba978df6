pub mod blocks;
pub mod extract;
pub mod format;
pub mod sections;
pub mod stats;

use std::time::Instant;

use tracing::info;

use crate::config::ParserOptions;
use crate::error::Diagnostics;
use crate::model::{Catalog, CatalogMetadata};
use extract::classify::{CourseClassifier, KeywordClassifier};
use extract::courses::{CourseExtractor, CourseLookups};
use extract::{ccn, certificates, degrees, descriptions, outcomes, standalone, units};
use format::{CatalogFormat, FormatDetector};
use sections::Section;

/// Course code: 1-4 capitals, 2-4 digits, optional suffix letter (`C182`, `D280A`).
pub(crate) const CODE_PATTERN: &str = r"[A-Z]{1,4}\d{2,4}[A-Z]?";
/// Common Course Number: subject and number (`ITEC 1010`).
pub(crate) const CCN_PATTERN: &str = r"[A-Z]{2,5} \d{3,4}";

const PAGE_BREAK: char = '\u{c}';
const SAMPLE_PAGES: usize = 10;
// Used when the text has no page breaks.
const SAMPLE_CHARS: usize = 30_000;

/// Text after the line and section passes, shared by every extractor.
struct Document<'a> {
    text: &'a str,
    blocks: Vec<blocks::Block>,
    sections: Vec<Section>,
}

impl<'a> Document<'a> {
    fn segment(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let blocks = blocks::classify_lines(text);
        let sections = sections::cluster_sections(&lines, &blocks);
        Document { text, blocks, sections }
    }
}

/// The first pages of the catalog, used to confirm the detected format.
pub fn sample_pages(text: &str, pages: usize) -> &str {
    if text.contains(PAGE_BREAK) {
        let end = text
            .match_indices(PAGE_BREAK)
            .nth(pages.saturating_sub(1))
            .map_or(text.len(), |(i, _)| i);
        return &text[..end];
    }
    match text.char_indices().nth(SAMPLE_CHARS) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

pub fn total_pages(text: &str) -> usize {
    text.matches(PAGE_BREAK).count() + 1
}

/// Runs every extractor over one catalog text. Holds only immutable
/// configuration, so one instance can serve many parses and threads.
pub struct CatalogParser {
    options: ParserOptions,
    detector: FormatDetector,
    courses: CourseExtractor,
    classifier: Box<dyn CourseClassifier>,
}

impl Default for CatalogParser {
    fn default() -> Self {
        CatalogParser::new(ParserOptions::default())
    }
}

impl CatalogParser {
    pub fn new(options: ParserOptions) -> Self {
        CatalogParser {
            options,
            detector: FormatDetector::default(),
            courses: CourseExtractor::default(),
            classifier: Box::new(KeywordClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn CourseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn detector(&self) -> &FormatDetector {
        &self.detector
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Format the catalog would be parsed with. Warnings are logged, not returned.
    pub fn detect(&self, text: &str, filename: &str) -> &CatalogFormat {
        let sample = sample_pages(text, SAMPLE_PAGES);
        let sample = Some(sample).filter(|s| !s.trim().is_empty());
        let (format, warning) = self.detector.detect(filename, sample);
        if let Some(w) = warning {
            tracing::warn!("{}", w);
        }
        format
    }

    /// Never fails: missing sections give empty collections and a warning.
    pub fn parse(&self, text: &str, filename: &str) -> Catalog {
        let t0 = Instant::now();
        let mut timer = stats::StageTimer::start();
        let mut diag = Diagnostics::default();

        let sample = sample_pages(text, SAMPLE_PAGES);
        let sample = Some(sample).filter(|s| !s.trim().is_empty());
        let (format, warning) = self.detector.detect(filename, sample);
        if let Some(w) = warning {
            diag.push(w);
        }
        timer.lap("detect");

        let doc = Document::segment(text);
        timer.lap("segment");

        let ccn_map = ccn::extract(&doc.blocks);
        let unit_map = units::extract(doc.text, &mut diag);
        let description_map = descriptions::extract(&doc.sections, self.options.min_description_chars, &mut diag);
        timer.lap("maps");

        let lookups = CourseLookups {
            ccn: &ccn_map,
            units: &unit_map,
            descriptions: &description_map,
        };
        let courses = self
            .courses
            .extract(doc.text, format, &lookups, self.classifier.as_ref(), &mut diag);
        timer.lap("courses");

        let degree_plans = degrees::extract(&doc.sections);
        timer.lap("degrees");

        let standalone = standalone::extract(&doc.sections, &mut diag);
        timer.lap("standalone");

        let certificate_programs = certificates::extract(&doc.sections, &mut diag);
        timer.lap("certificates");

        let program_outcomes = outcomes::extract(&doc.sections, &mut diag);
        timer.lap("outcomes");

        let duplicate_codes = courses.duplicates();
        let discarded_records = diag.discarded();
        let mut catalog = Catalog {
            courses: courses.courses,
            degree_plans,
            standalone_courses: standalone.courses,
            certificate_programs,
            program_outcomes,
            course_bundles: standalone.bundles,
            metadata: CatalogMetadata {
                catalog_date: format::catalog_date(filename),
                format_version: format.version,
                parser_version: self.options.parser_version.clone(),
                parsed_at: chrono::Utc::now().to_rfc3339(),
                total_pages: total_pages(text),
                parsing_time_ms: 0,
                warnings: diag.into_messages(),
                statistics: Default::default(),
            },
        };

        let counters = stats::Counters {
            duplicate_codes,
            discarded_records,
        };
        let statistics = stats::compute(&catalog, counters, timer.into_timings());
        catalog.metadata.statistics = statistics;
        catalog.metadata.parsing_time_ms = t0.elapsed().as_millis() as u64;

        let s = &catalog.metadata.statistics;
        info!(
            "{}: {} format, {} courses, {} degree plans, {} standalone, {} certificates, {} outcome sets in {} ms",
            filename,
            format.version,
            s.courses_found,
            s.degree_plans_found,
            s.standalone_courses_found,
            s.certificates_found,
            s.program_outcomes_found,
            catalog.metadata.parsing_time_ms,
        );

        catalog
    }
}

/// Parse with default options and the keyword classifier.
pub fn parse_catalog(text: &str, filename: &str) -> Catalog {
    CatalogParser::default().parse(text, filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseType;
    use format::FormatVersion;

    fn fixture(name: &str) -> String {
        let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path, e))
    }

    #[test]
    fn ccn_units_and_detailed_description_merge() {
        let detailed: String = "Surveys the IT discipline and its roles. ".repeat(3).chars().take(120).collect();
        assert_eq!(detailed.chars().count(), 120);
        let text = format!(
            "Degree Programs\n\
             Program: Bachelor of Science, Information Technology\n\
             CCN Course Number Course Description CUs Term\n\
             ITEC 1010 C182 3\n\
             C182 - Intro to IT - Short desc\n\
             Course Descriptions\n\
             C182 - Intro to IT - {}\n",
            detailed
        );
        let catalog = parse_catalog(&text, "catalog_2021.txt");
        assert_eq!(catalog.metadata.format_version, FormatVersion::Modern);

        let c182 = &catalog.courses["C182"];
        assert_eq!(c182.ccn.as_deref(), Some("ITEC 1010"));
        assert_eq!(c182.competency_units, Some(3));
        assert_eq!(c182.description.as_deref(), Some(detailed.as_str()));
        assert_eq!(c182.course_type, Some(CourseType::Core));
    }

    #[test]
    fn legacy_line_count_equals_course_count() {
        let lines: Vec<String> = (0..25)
            .map(|i| format!("C{} - Legacy Course {} (3 CUs) [ITEC {}]", 100 + i, i, 1000 + i))
            .collect();
        let catalog = parse_catalog(&lines.join("\n"), "catalog_2018.txt");
        assert_eq!(catalog.metadata.format_version, FormatVersion::Legacy);
        assert_eq!(catalog.courses.len(), 25);
        assert_eq!(catalog.metadata.statistics.ccn_coverage, 100.0);
        assert_eq!(catalog.metadata.statistics.cu_coverage, 100.0);
    }

    #[test]
    fn missing_sections_are_empty_with_warnings() {
        let catalog = parse_catalog("C182 - Intro to IT - Short desc", "catalog_2024.txt");
        assert!(catalog.program_outcomes.is_empty());
        assert!(catalog.standalone_courses.is_empty());
        assert!(catalog.certificate_programs.is_empty());
        assert!(catalog
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("Program Outcomes")));
    }

    #[test]
    fn empty_text_still_parses() {
        let catalog = parse_catalog("", "whatever.txt");
        assert!(catalog.courses.is_empty());
        assert_eq!(catalog.metadata.statistics.ccn_coverage, 0.0);
        assert_eq!(catalog.metadata.format_version, FormatVersion::Enhanced);
        assert_eq!(catalog.metadata.total_pages, 1);
        assert!(catalog.metadata.warnings.iter().any(|w| w.contains("no format signature")));
    }

    #[test]
    fn sampling_stops_at_page_limit() {
        let text = (1..=15).map(|p| format!("page body {}", p)).collect::<Vec<_>>().join("\u{c}");
        let sample = sample_pages(&text, 10);
        assert!(sample.ends_with("page body 10"));
        assert_eq!(total_pages(&text), 15);
        assert_eq!(sample_pages("short", 10), "short");
    }

    #[test]
    fn legacy_fixture() {
        let catalog = parse_catalog(&fixture("legacy_2018.txt"), "catalog_2018.txt");
        let s = &catalog.metadata.statistics;
        assert_eq!(catalog.metadata.format_version, FormatVersion::Legacy);
        assert_eq!(catalog.metadata.catalog_date.as_deref(), Some("2018"));
        assert_eq!(s.courses_found, 6);
        assert_eq!(catalog.courses["C278"].course_type, Some(CourseType::GeneralEducation));
        assert_eq!(catalog.courses["C769"].course_type, Some(CourseType::Capstone));
        assert_eq!(catalog.degree_plans.len(), 1);
        assert_eq!(catalog.degree_plans[0].code.as_deref(), Some("BSIT"));
        assert_eq!(catalog.degree_plans[0].total_cus, Some(120));
        assert_eq!(catalog.metadata.total_pages, 2);
    }

    #[test]
    fn modern_fixture() {
        let catalog = parse_catalog(&fixture("modern_2021.txt"), "catalog_2021-07.txt");
        let s = &catalog.metadata.statistics;
        assert_eq!(catalog.metadata.format_version, FormatVersion::Modern);
        assert_eq!(catalog.metadata.catalog_date.as_deref(), Some("2021-07"));
        assert_eq!(s.ccn_coverage, 100.0);
        assert_eq!(s.cu_coverage, 100.0);

        let c950 = &catalog.courses["C950"];
        assert_eq!(c950.ccn.as_deref(), Some("ITEC 3001"));
        assert_eq!(c950.competency_units, Some(4));
        assert_eq!(c950.prerequisites, vec!["C949"]);
        assert!(c950.description.as_deref().is_some_and(|d| d.starts_with("Builds on")));

        let plan = &catalog.degree_plans[0];
        assert_eq!(plan.name, "Bachelor of Science, Computer Science");
        assert_eq!(plan.courses, vec!["C949", "C950", "C278"]);
        assert_eq!(plan.school.as_deref(), Some("School of Technology"));
        assert_eq!(s.unresolved_plan_courses, 0);
    }

    #[test]
    fn enhanced_fixture() {
        let catalog = parse_catalog(&fixture("enhanced_2024.txt"), "catalog_2024_01.txt");
        let s = &catalog.metadata.statistics;
        assert_eq!(catalog.metadata.format_version, FormatVersion::Enhanced);
        assert!(catalog.metadata.warnings.is_empty(), "{:?}", catalog.metadata.warnings);

        assert_eq!(catalog.courses["D123"].name, "Public Health Foundations");
        let bshhs = catalog
            .degree_plans
            .iter()
            .find(|p| p.code.as_deref() == Some("BSHHS"))
            .unwrap();
        assert_eq!(bshhs.courses, vec!["D123", "D124"]);
        assert_eq!(bshhs.total_cus, Some(120));
        assert_eq!(s.standalone_courses_found, 2);
        assert_eq!(s.bundles_found, 1);
        assert_eq!(catalog.course_bundles[0].courses, vec!["C182", "D280"]);
        assert_eq!(s.certificates_found, 1);
        assert_eq!(catalog.certificate_programs[&crate::model::CertificateId(1)].price, 3000.0);
        assert_eq!(s.program_outcomes_found, 2);
        assert!(catalog
            .program_outcomes
            .contains_key("School of Technology_Bachelor of Science, Cybersecurity and Information Assurance"));
        assert!(s.stage_timings_ms.contains_key("courses"));
    }

    #[test]
    fn custom_classifier_is_used() {
        struct AllElective;
        impl CourseClassifier for AllElective {
            fn classify(&self, _: &str, _: Option<&str>, _: Option<&str>, _: Option<&str>) -> CourseType {
                CourseType::Elective
            }
        }
        let parser = CatalogParser::default().with_classifier(Box::new(AllElective));
        let catalog = parser.parse("C182 - Intro to IT (3 CUs) [ITEC 1010]", "catalog_2017.txt");
        assert_eq!(catalog.courses["C182"].course_type, Some(CourseType::Elective));
    }
}
