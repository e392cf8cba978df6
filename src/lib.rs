//! Academic catalog text → structured courses, degree plans, standalone
//! offerings, certificates and program outcomes.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;

pub use config::{ParserOptions, Settings};
pub use error::ParseWarning;
pub use model::Catalog;
pub use parser::{parse_catalog, CatalogParser};
