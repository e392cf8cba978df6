use std::sync::LazyLock;

use regex::Regex;

use super::sections::SectionKind;
use super::{CCN_PATTERN, CODE_PATTERN};

static PROGRAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Program:\s*(.+)$").unwrap());
static DEGREE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Bachelor|Master|Associate|Doctor)(?:'s)? of\b.*$").unwrap());
static DEGREE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(([A-Z][A-Za-z.]{1,11})\)\s*$").unwrap());
static TABLE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CCN\s+Course\s+(?:Number\s+)?Course\s+Description").unwrap());
static CCN_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({CCN_PATTERN})\s+({CODE_PATTERN})\b\s*(.*)$")).unwrap());
static COURSE_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({CODE_PATTERN})\b\s*(.*)$")).unwrap());
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[•●▪◦*\-–]|\d{1,2}[.)])\s+(.+)$").unwrap());
static ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:page\s+)?\d{1,4}(?:\s+of\s+\d{1,4})?|©.*|copyright\b.*)$").unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(SectionKind),
    DegreeTitle { name: String, code: Option<String> },
    ProgramHeader(String),
    TableHeader,
    CcnRow { ccn: String, code: String, rest: String },
    CourseRow { code: String, rest: String },
    Bullet(String),
    /// Page numbers, copyright lines.
    Artifact,
    Text(String),
    Empty,
}

/// One block per input line, so `blocks[i]` always describes `text.lines().nth(i)`.
pub fn classify_lines(text: &str) -> Vec<Block> {
    text.lines().map(classify_line).collect()
}

pub fn classify_line(raw: &str) -> Block {
    let line = raw.trim();
    if line.is_empty() {
        return Block::Empty;
    }

    if let Some(kind) = SectionKind::from_heading(line) {
        return Block::Heading(kind);
    }

    if let Some(caps) = PROGRAM_RE.captures(line) {
        return Block::ProgramHeader(caps[1].trim().to_string());
    }

    if line.len() < 160 && !line.ends_with('.') && DEGREE_TITLE_RE.is_match(line) {
        let code = DEGREE_CODE_RE.captures(line).map(|c| c[1].to_string());
        let name = DEGREE_CODE_RE.replace(line, "").trim().to_string();
        return Block::DegreeTitle { name, code };
    }

    if TABLE_HEADER_RE.is_match(line) {
        return Block::TableHeader;
    }

    if let Some(caps) = CCN_ROW_RE.captures(line) {
        return Block::CcnRow {
            ccn: caps[1].to_string(),
            code: caps[2].to_string(),
            rest: caps[3].trim().to_string(),
        };
    }

    if let Some(caps) = COURSE_ROW_RE.captures(line) {
        return Block::CourseRow {
            code: caps[1].to_string(),
            rest: caps[2].trim().to_string(),
        };
    }

    if let Some(caps) = BULLET_RE.captures(line) {
        return Block::Bullet(caps[1].trim().to_string());
    }

    if ARTIFACT_RE.is_match(line) {
        return Block::Artifact;
    }

    Block::Text(line.to_string())
}

impl Block {
    /// Starts a new region for the table/degree scanners.
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            Block::Heading(_) | Block::DegreeTitle { .. } | Block::ProgramHeader(_) | Block::TableHeader
        )
    }
}
