use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseWarning;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\D)(20\d{2})(?:(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01])?)?(?:\D|$)").unwrap());
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(20\d{2})[-_ .]?(0[1-9]|1[0-2])(?:[-_ .]?(?:0[1-9]|[12]\d|3[01]))?(?:\D|$)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatVersion {
    Legacy,
    Modern,
    Enhanced,
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FormatVersion::Legacy => "legacy",
            FormatVersion::Modern => "modern",
            FormatVersion::Enhanced => "enhanced",
        };
        f.write_str(s)
    }
}

/// How course records are pulled out of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// `CODE - Name (N credits) [CCN]`, self-contained.
    InlineCcn,
    /// `CODE - Name - Description` plus the whitespace-collapsed `CODENameNN` pass.
    PrimaryAndConcatenated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// No CCN table; CCN sits on the course line.
    Inline,
    /// `CCN Course Number Course Description` tables.
    CcnTable,
    /// CCN tables plus outcome/standalone sections.
    CcnTableWithSections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: u16,
    /// `None` means still current.
    pub end: Option<u16>,
}

impl YearRange {
    pub fn contains(&self, year: u16) -> bool {
        year >= self.start && self.end.map_or(true, |end| year <= end)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogFormat {
    pub version: FormatVersion,
    pub strategy: ExtractionStrategy,
    pub year_range: YearRange,
    pub content_pattern: Regex,
    pub table_format: TableFormat,
}

impl CatalogFormat {
    pub fn matches_content(&self, sample: &str) -> bool {
        self.content_pattern.is_match(sample)
    }
}

/// The catalog generations in chronological order. Last entry is the fallback.
pub fn default_registry() -> Vec<CatalogFormat> {
    vec![
        CatalogFormat {
            version: FormatVersion::Legacy,
            strategy: ExtractionStrategy::InlineCcn,
            year_range: YearRange { start: 2017, end: Some(2018) },
            content_pattern: Regex::new(
                r"(?m)^\s*[A-Z]{1,4}\d{2,4}[A-Z]? - .+?\(\d{1,2} (?:credits?|CUs?)\)\s*\[?[A-Z]{2,5} \d{3,4}\]?",
            )
            .unwrap(),
            table_format: TableFormat::Inline,
        },
        CatalogFormat {
            version: FormatVersion::Modern,
            strategy: ExtractionStrategy::PrimaryAndConcatenated,
            year_range: YearRange { start: 2019, end: Some(2022) },
            content_pattern: Regex::new(r"CCN\s+Course\s+(?:Number\s+)?Course\s+Description").unwrap(),
            table_format: TableFormat::CcnTable,
        },
        CatalogFormat {
            version: FormatVersion::Enhanced,
            strategy: ExtractionStrategy::PrimaryAndConcatenated,
            year_range: YearRange { start: 2023, end: None },
            content_pattern: Regex::new(r"Program Outcomes|Standalone Courses").unwrap(),
            table_format: TableFormat::CcnTableWithSections,
        },
    ]
}

pub struct FormatDetector {
    registry: Vec<CatalogFormat>,
}

impl Default for FormatDetector {
    fn default() -> Self {
        FormatDetector {
            registry: default_registry(),
        }
    }
}

impl FormatDetector {
    /// Registry ordered oldest to newest. `None` when empty, since detection
    /// needs a newest entry to fall back to.
    pub fn new(registry: Vec<CatalogFormat>) -> Option<Self> {
        if registry.is_empty() {
            return None;
        }
        Some(FormatDetector { registry })
    }

    pub fn registry(&self) -> &[CatalogFormat] {
        &self.registry
    }

    /// Pick a format from the filename year, confirmed by `sample` when given.
    /// Always returns something; the warning is set when nothing matched.
    pub fn detect(&self, filename: &str, sample: Option<&str>) -> (&CatalogFormat, Option<ParseWarning>) {
        let by_year = extract_year(filename)
            .and_then(|year| self.registry.iter().find(|f| f.year_range.contains(year)));

        if let Some(format) = by_year {
            match sample {
                None => return (format, None),
                Some(text) if format.matches_content(text) => return (format, None),
                Some(_) => {
                    tracing::debug!(
                        "year suggests {} but content signature disagrees for {}",
                        format.version,
                        filename
                    );
                }
            }
        }

        if let Some(text) = sample {
            if let Some(format) = self.registry.iter().find(|f| f.matches_content(text)) {
                return (format, None);
            }
        }

        let newest = self.newest();
        let warning = ParseWarning::NoFormatMatch {
            filename: filename.to_string(),
            fallback: newest.version.to_string(),
        };
        (newest, Some(warning))
    }

    fn newest(&self) -> &CatalogFormat {
        // new() guarantees at least one entry
        &self.registry[self.registry.len() - 1]
    }
}

pub fn extract_year(filename: &str) -> Option<u16> {
    YEAR_RE
        .captures(filename)
        .and_then(|c| c[1].parse::<u16>().ok())
}

/// `YYYY-MM` when the filename carries a month after the year, else `YYYY`.
pub fn catalog_date(filename: &str) -> Option<String> {
    if let Some(caps) = YEAR_MONTH_RE.captures(filename) {
        return Some(format!("{}-{}", &caps[1], &caps[2]));
    }
    extract_year(filename).map(|y| y.to_string())
}
