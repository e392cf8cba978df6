use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "catalog_parser";

/// Runtime settings: defaults, then `catalog_parser.toml`, then `CATALOG_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub parser_version: String,
    pub log_filter: String,
    pub min_description_chars: usize,
    pub batch_chunk_size: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("parser_version", env!("CARGO_PKG_VERSION"))?
            .set_default("log_filter", "info")?
            .set_default("min_description_chars", 20_i64)?
            .set_default("batch_chunk_size", 64_i64)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("CATALOG").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            parser_version: self.parser_version.clone(),
            min_description_chars: self.min_description_chars,
        }
    }
}

/// Immutable knobs handed to a `CatalogParser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub parser_version: String,
    /// Description-map entries shorter than this are noise.
    pub min_description_chars: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            parser_version: env!("CARGO_PKG_VERSION").to_string(),
            min_description_chars: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_file_or_env() {
        let settings = Settings::load().unwrap();
        let opts = settings.parser_options();
        assert!(!opts.parser_version.is_empty());
        assert!(settings.batch_chunk_size > 0);
    }

    #[test]
    fn default_options_thresholds() {
        let opts = ParserOptions::default();
        assert_eq!(opts.min_description_chars, 20);
    }
}
