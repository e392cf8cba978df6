use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;

use crate::model::{Catalog, Statistics};

static VALID_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{1,4}\d{3,4}[A-Z]?$").unwrap());

/// Records wall time per pipeline stage.
pub struct StageTimer {
    last: Instant,
    timings: BTreeMap<String, f64>,
}

impl StageTimer {
    pub fn start() -> Self {
        StageTimer {
            last: Instant::now(),
            timings: BTreeMap::new(),
        }
    }

    pub fn lap(&mut self, stage: &str) {
        let now = Instant::now();
        let ms = now.duration_since(self.last).as_secs_f64() * 1000.0;
        *self.timings.entry(stage.to_string()).or_insert(0.0) += round2(ms);
        self.last = now;
    }

    pub fn into_timings(self) -> BTreeMap<String, f64> {
        self.timings
    }
}

pub struct Counters {
    pub duplicate_codes: usize,
    pub discarded_records: usize,
}

pub fn compute(catalog: &Catalog, counters: Counters, timings: BTreeMap<String, f64>) -> Statistics {
    let courses = &catalog.courses;
    let total = courses.len();
    let with_ccn = courses.values().filter(|c| c.ccn.is_some()).count();
    let with_cu = courses.values().filter(|c| c.competency_units.is_some()).count();
    let with_desc = courses.values().filter(|c| c.description.is_some()).count();
    let invalid = courses.keys().filter(|code| !is_valid_code(code)).count();

    Statistics {
        courses_found: total,
        degree_plans_found: catalog.degree_plans.len(),
        standalone_courses_found: catalog.standalone_courses.len(),
        certificates_found: catalog.certificate_programs.len(),
        program_outcomes_found: catalog.program_outcomes.len(),
        bundles_found: catalog.course_bundles.len(),
        ccn_coverage: percent(with_ccn, total),
        cu_coverage: percent(with_cu, total),
        description_coverage: percent(with_desc, total),
        duplicate_codes: counters.duplicate_codes,
        invalid_codes: invalid,
        discarded_records: counters.discarded_records,
        unresolved_plan_courses: catalog.unresolved_plan_courses().len(),
        stage_timings_ms: timings,
    }
}

pub fn is_valid_code(code: &str) -> bool {
    VALID_CODE_RE.is_match(code)
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / total as f64)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Plain-text quality report for one parsed catalog.
pub fn render_report(name: &str, catalog: &Catalog) -> String {
    let meta = &catalog.metadata;
    let s = &meta.statistics;
    let mut out = String::new();

    let _ = writeln!(out, "# Catalog quality report: {}", name);
    let _ = writeln!(
        out,
        "format: {} | date: {} | pages: {} | parsed in {} ms | parser {}",
        meta.format_version,
        meta.catalog_date.as_deref().unwrap_or("-"),
        meta.total_pages,
        meta.parsing_time_ms,
        meta.parser_version,
    );
    out.push('\n');

    let _ = writeln!(out, "{:<26} {:>8}", "Entity", "Found");
    let _ = writeln!(out, "{}", "-".repeat(35));
    for (label, n) in [
        ("courses", s.courses_found),
        ("degree plans", s.degree_plans_found),
        ("standalone courses", s.standalone_courses_found),
        ("certificate programs", s.certificates_found),
        ("program outcome sets", s.program_outcomes_found),
        ("course bundles", s.bundles_found),
    ] {
        let _ = writeln!(out, "{:<26} {:>8}", label, n);
    }
    out.push('\n');

    let _ = writeln!(out, "{:<26} {:>8}", "Coverage", "%");
    let _ = writeln!(out, "{}", "-".repeat(35));
    for (label, pct) in [
        ("CCN", s.ccn_coverage),
        ("competency units", s.cu_coverage),
        ("description", s.description_coverage),
    ] {
        let _ = writeln!(out, "{:<26} {:>8.1}", label, pct);
    }
    out.push('\n');

    let _ = writeln!(out, "duplicate codes: {}", s.duplicate_codes);
    let _ = writeln!(out, "invalid codes: {}", s.invalid_codes);
    let _ = writeln!(out, "discarded records: {}", s.discarded_records);
    let _ = writeln!(out, "unresolved degree-plan courses: {}", s.unresolved_plan_courses);

    if !s.stage_timings_ms.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "stage timings (ms):");
        for (stage, ms) in &s.stage_timings_ms {
            let _ = writeln!(out, "  {:<14} {:>9.2}", stage, ms);
        }
    }

    if !meta.warnings.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "warnings:");
        for w in &meta.warnings {
            let _ = writeln!(out, "  - {}", w);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(3, 3), 100.0);
    }

    #[test]
    fn code_validity() {
        assert!(is_valid_code("C182"));
        assert!(is_valid_code("D280A"));
        assert!(is_valid_code("ITEC1010"));
        assert!(!is_valid_code("AB12"));
        assert!(!is_valid_code("c182"));
    }

    #[test]
    fn timer_accumulates_stages() {
        let mut timer = StageTimer::start();
        timer.lap("detect");
        timer.lap("courses");
        timer.lap("courses");
        let t = timer.into_timings();
        assert_eq!(t.len(), 2);
        assert!(t["courses"] >= 0.0);
    }
}
