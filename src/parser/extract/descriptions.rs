use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::strip_artifacts;
use crate::error::{Diagnostics, ParseWarning};
use crate::parser::blocks::Block;
use crate::parser::sections::{find_section, Section, SectionKind};

/// Course code → detailed description.
pub type DescriptionMap = HashMap<String, String>;

static LEAD_DELIM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-–—]\s*(.*)$").unwrap());
static NAME_DELIM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s[-–—]\s").unwrap());

struct Entry {
    code: String,
    /// Text after the code on the lead line, name already dropped if delimited.
    lead: String,
    /// Lead line had no `Name - ` delimiter.
    bare: bool,
    parts: Vec<String>,
}

/// Pull `CODE - Name - Description` entries out of the Course Descriptions
/// section. Entries may wrap over several lines; they end where the next
/// delimited course code starts.
pub fn extract(sections: &[Section], min_chars: usize, diag: &mut Diagnostics) -> DescriptionMap {
    let Some(section) = find_section(sections, SectionKind::CourseDescriptions) else {
        diag.push(ParseWarning::missing(SectionKind::CourseDescriptions.title()));
        return DescriptionMap::new();
    };

    let mut map = DescriptionMap::new();
    let mut current: Option<Entry> = None;

    for (block, line) in section.entries() {
        match block {
            Block::CourseRow { code, rest } if LEAD_DELIM_RE.is_match(rest) => {
                if let Some(entry) = current.take() {
                    finish(entry, min_chars, &mut map, diag);
                }
                let body = LEAD_DELIM_RE
                    .captures(rest)
                    .map(|c| c[1].to_string())
                    .unwrap_or_default();
                // Drop the name when the line is `Name - Description`.
                let (lead, bare) = match NAME_DELIM_RE.find(&body) {
                    Some(m) => (body[m.end()..].to_string(), false),
                    None => (body, true),
                };
                current = Some(Entry {
                    code: code.clone(),
                    lead,
                    bare,
                    parts: Vec::new(),
                });
            }
            Block::Empty | Block::Artifact => {}
            _ => {
                if let Some(entry) = current.as_mut() {
                    entry.parts.push(line.to_string());
                }
            }
        }
    }
    if let Some(entry) = current.take() {
        finish(entry, min_chars, &mut map, diag);
    }

    debug!("description map: {} entries", map.len());
    map
}

fn finish(entry: Entry, min_chars: usize, map: &mut DescriptionMap, diag: &mut Diagnostics) {
    // A bare lead followed by wrapped lines is the course name alone.
    let text = if entry.bare && !entry.parts.is_empty() {
        strip_artifacts(&entry.parts.join(" "))
    } else {
        let mut all = vec![entry.lead];
        all.extend(entry.parts);
        strip_artifacts(&all.join(" "))
    };
    if text.chars().count() < min_chars {
        diag.push(ParseWarning::malformed("description", format!("{}: '{}'", entry.code, text)));
        return;
    }
    map.insert(entry.code, text);
}
