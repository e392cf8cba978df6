use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::format::FormatVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    GeneralEducation,
    Core,
    Capstone,
    Elective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency_units: Option<u8>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub course_type: Option<CourseType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreePlan {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    /// Course codes in catalog order. Not checked against the course map.
    pub courses: Vec<String>,
    #[serde(rename = "totalCUs", skip_serializing_if = "Option::is_none")]
    pub total_cus: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandaloneCourse {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency_units: Option<u8>,
}

/// Sequential certificate id, written as `CERT{n}`. Orders by number, so
/// `CERT10` sorts after `CERT9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CertificateId(pub u32);

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CERT{}", self.0)
    }
}

impl std::str::FromStr for CertificateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("CERT")
            .and_then(|n| n.parse().ok())
            .map(CertificateId)
            .ok_or_else(|| format!("invalid certificate id '{}'", s))
    }
}

impl Serialize for CertificateId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CertificateId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateProgram {
    pub id: CertificateId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(rename = "totalCUs", skip_serializing_if = "Option::is_none")]
    pub total_cus: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Technical,
    Professional,
    Analytical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<OutcomeCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutcome {
    pub school: String,
    pub program: String,
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseBundleInfo {
    pub courses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub courses_found: usize,
    pub degree_plans_found: usize,
    pub standalone_courses_found: usize,
    pub certificates_found: usize,
    pub program_outcomes_found: usize,
    pub bundles_found: usize,
    /// Percent of courses with a CCN, 0-100.
    pub ccn_coverage: f64,
    pub cu_coverage: f64,
    pub description_coverage: f64,
    pub duplicate_codes: usize,
    pub invalid_codes: usize,
    pub discarded_records: usize,
    pub unresolved_plan_courses: usize,
    #[serde(rename = "stageTimingsMs")]
    pub stage_timings_ms: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub catalog_date: Option<String>,
    pub format_version: FormatVersion,
    pub parser_version: String,
    pub parsed_at: String,
    pub total_pages: usize,
    pub parsing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub statistics: Statistics,
}

/// One completed parse. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub courses: BTreeMap<String, Course>,
    pub degree_plans: Vec<DegreePlan>,
    pub standalone_courses: BTreeMap<String, StandaloneCourse>,
    pub certificate_programs: BTreeMap<CertificateId, CertificateProgram>,
    pub program_outcomes: BTreeMap<String, ProgramOutcome>,
    pub course_bundles: Vec<CourseBundleInfo>,
    pub metadata: CatalogMetadata,
}

impl Catalog {
    /// Degree-plan course codes that have no entry in the course map.
    pub fn unresolved_plan_courses(&self) -> Vec<(&str, &str)> {
        self.degree_plans
            .iter()
            .flat_map(|plan| {
                plan.courses
                    .iter()
                    .filter(|code| !self.courses.contains_key(code.as_str()))
                    .map(move |code| (plan.name.as_str(), code.as_str()))
            })
            .collect()
    }
}
