use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Diagnostics, ParseWarning};
use crate::parser::{CCN_PATTERN, CODE_PATTERN};

/// Course code → competency units.
pub type UnitMap = HashMap<String, u8>;

pub const MIN_UNITS: u32 = 1;
pub const MAX_UNITS: u32 = 12;

// `CODE N Name…`, optionally behind a CCN. Bare `CODE N` only counts with the CCN.
static UNIT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*(?:(?P<ccn>{CCN_PATTERN})[ \t]+)?(?P<code>{CODE_PATTERN})[ \t]+(?P<units>\d{{1,3}})(?:[ \t]+(?P<name>\S[^\n]*?))?[ \t]*$"
    ))
    .unwrap()
});

// Modern table rows: `CCN CODE Name… CUs Term`
static TABLE_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{CCN_PATTERN}[ \t]+(?P<code>{CODE_PATTERN})[ \t]+[A-Za-z][^\n]*?[ \t](?P<units>\d{{1,3}})[ \t]+\d[ \t]*$"
    ))
    .unwrap()
});

/// Competency units in range; anything else is a page number or similar noise.
pub fn valid_units(raw: &str) -> Option<u8> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| (MIN_UNITS..=MAX_UNITS).contains(n))
        .map(|n| n as u8)
}

pub fn extract(text: &str, diag: &mut Diagnostics) -> UnitMap {
    let mut map = UnitMap::new();

    for caps in UNIT_LINE_RE.captures_iter(text) {
        if caps.name("ccn").is_none() && caps.name("name").is_none() {
            continue;
        }
        record(&mut map, &caps["code"], &caps["units"], diag);
    }

    for caps in TABLE_TAIL_RE.captures_iter(text) {
        record(&mut map, &caps["code"], &caps["units"], diag);
    }

    debug!("CU map: {} codes", map.len());
    map
}

fn record(map: &mut UnitMap, code: &str, raw: &str, diag: &mut Diagnostics) {
    match valid_units(raw) {
        Some(units) => {
            map.insert(code.to_string(), units);
        }
        None => diag.push(ParseWarning::malformed("competency units", format!("{} {}", code, raw))),
    }
}
