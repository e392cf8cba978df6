use thiserror::Error;

/// Conditions the pipeline recovers from. None of these abort a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("section '{section}' not found")]
    MissingSection { section: String },

    #[error("no format signature matched '{filename}', using {fallback}")]
    NoFormatMatch { filename: String, fallback: String },

    #[error("discarded {kind} record: {detail}")]
    MalformedRecord { kind: &'static str, detail: String },
}

impl ParseWarning {
    pub fn missing(section: &str) -> Self {
        ParseWarning::MissingSection {
            section: section.to_string(),
        }
    }

    pub fn malformed(kind: &'static str, detail: impl Into<String>) -> Self {
        ParseWarning::MalformedRecord {
            kind,
            detail: detail.into(),
        }
    }
}

/// Collects warnings raised by the extractors during one parse.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<ParseWarning>,
    discarded: usize,
}

impl Diagnostics {
    pub fn push(&mut self, warning: ParseWarning) {
        match &warning {
            ParseWarning::MalformedRecord { .. } => {
                tracing::trace!("{}", warning);
                self.discarded += 1;
            }
            _ => {
                tracing::warn!("{}", warning);
                self.warnings.push(warning);
            }
        }
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn into_messages(self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_records_are_counted_not_kept() {
        let mut diag = Diagnostics::default();
        diag.push(ParseWarning::malformed("cu", "C100 15"));
        diag.push(ParseWarning::missing("Program Outcomes"));
        assert_eq!(diag.discarded(), 1);
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(
            diag.into_messages(),
            vec!["section 'Program Outcomes' not found".to_string()]
        );
    }
}
