// ==========================================
// Correlativities Engine - Import Layer
// ==========================================
// Catalog seeding from CSV files
// ==========================================

pub mod catalog_importer;
pub mod csv_parser;
pub mod error;

pub use catalog_importer::{CatalogImporter, ImportSummary, RowRejection};
pub use csv_parser::{CsvParser, RawRow};
pub use error::{ImportError, ImportResult};
