use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{course_codes_in, normalize_whitespace, parse_price};
use crate::error::{Diagnostics, ParseWarning};
use crate::model::{CertificateId, CertificateProgram};
use crate::parser::blocks::Block;
use crate::parser::sections::{find_section, Section, SectionKind};

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\s?([\d,]+(?:\.\d{2})?)").unwrap());
static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:total\s+)?(?:CUs|competency units)\b").unwrap()
});
// Short title-like line naming a certificate.
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][^$.]{2,100}$").unwrap());
static CERTIFICATE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bCertificate\b").unwrap());

struct CertBlock {
    name: String,
    lines: Vec<String>,
}

/// One certificate per title line. IDs are `CERT1`, `CERT2`, … in document order.
pub fn extract(sections: &[Section], diag: &mut Diagnostics) -> BTreeMap<CertificateId, CertificateProgram> {
    let mut out = BTreeMap::new();
    let Some(section) = find_section(sections, SectionKind::Certificates) else {
        diag.push(ParseWarning::missing(SectionKind::Certificates.title()));
        return out;
    };

    let mut blocks: Vec<CertBlock> = Vec::new();
    for (block, line) in section.entries() {
        let is_title = matches!(block, Block::Text(_) | Block::DegreeTitle { .. })
            && TITLE_RE.is_match(line)
            && CERTIFICATE_WORD_RE.is_match(line);
        if is_title {
            blocks.push(CertBlock {
                name: line.to_string(),
                lines: Vec::new(),
            });
            continue;
        }
        if matches!(block, Block::Empty | Block::Artifact) {
            continue;
        }
        if let Some(current) = blocks.last_mut() {
            current.lines.push(line.to_string());
        }
    }

    let mut seq = 0;
    for block in blocks {
        let body = normalize_whitespace(&block.lines.join(" "));
        let Some(price) = PRICE_RE.captures(&body).and_then(|c| parse_price(&c[1])) else {
            diag.push(ParseWarning::malformed("certificate", format!("{}: no price", block.name)));
            continue;
        };
        let total_cus = TOTAL_RE.captures(&body).and_then(|c| c[1].parse().ok());
        let courses = course_codes_in(&body);

        seq += 1;
        let id = CertificateId(seq);
        out.insert(
            id,
            CertificateProgram {
                id,
                name: block.name,
                description: Some(body).filter(|b| !b.is_empty()),
                price,
                total_cus,
                courses,
            },
        );
    }

    debug!("certificates: {}", out.len());
    out
}
