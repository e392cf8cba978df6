use std::collections::HashMap;

use tracing::debug;

use crate::parser::blocks::Block;

/// Course code → CCN.
pub type CcnMap = HashMap<String, String>;

/// Read every `CCN Course Number Course Description` table. A table runs until
/// the next heading, degree title, program header or table header.
///
/// Duplicate codes keep the CCN scanned last.
pub fn extract(blocks: &[Block]) -> CcnMap {
    let mut map = CcnMap::new();
    let mut in_table = false;
    let mut tables = 0usize;
    let mut rows = 0usize;

    for block in blocks {
        match block {
            Block::TableHeader => {
                in_table = true;
                tables += 1;
            }
            b if b.is_boundary() => in_table = false,
            Block::CcnRow { ccn, code, .. } if in_table => {
                rows += 1;
                if let Some(prev) = map.insert(code.clone(), ccn.clone()) {
                    if prev != *ccn {
                        debug!("CCN for {} changed {} -> {}", code, prev, ccn);
                    }
                }
            }
            _ => {}
        }
    }

    debug!("CCN map: {} codes from {} rows in {} tables", map.len(), rows, tables);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::classify_lines;

    #[test]
    fn rows_under_header() {
        let blocks = classify_lines(
            "CCN Course Number Course Description\nITEC 1010 C182 Introduction to IT 3 1\nMATH 1010 C278 College Algebra 4 1",
        );
        let map = extract(&blocks);
        assert_eq!(map.get("C182").map(String::as_str), Some("ITEC 1010"));
        assert_eq!(map.get("C278").map(String::as_str), Some("MATH 1010"));
    }

    #[test]
    fn duplicate_code_last_wins() {
        let blocks = classify_lines(
            "CCN Course Number Course Description\nITEC 1010 C182 Intro 3\n\nCCN Course Course Description\nITEC 2002 C182 Intro 3",
        );
        let map = extract(&blocks);
        assert_eq!(map.len(), 1);
        assert_eq!(map["C182"], "ITEC 2002");
    }

    #[test]
    fn rows_outside_tables_ignored() {
        let blocks = classify_lines(
            "ITEC 1010 C182 Intro 3\nCCN Course Number Course Description\nITEC 1010 C183 Other 3\nProgram Outcomes\nITEC 1010 C184 Stray",
        );
        let map = extract(&blocks);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["C183"]);
    }
}
