// ==========================================
// Correlativities Engine - CSV Parser
// ==========================================
// Header row = column names; values trimmed; blank rows skipped
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// One data row: 1-based line number (header is line 1) + column map
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: usize,
    pub values: HashMap<String, String>,
}

impl RawRow {
    /// Trimmed value; None when the column is absent or blank
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, column: &str) -> Result<&str, String> {
        self.get(column)
            .ok_or_else(|| format!("column {} is empty", column))
    }

    pub fn require_i32(&self, column: &str) -> Result<i32, String> {
        let raw = self.require(column)?;
        raw.parse::<i32>()
            .map_err(|e| format!("column {}: {} is not an integer ({})", column, raw, e))
    }
}

pub struct CsvParser;

impl CsvParser {
    /// Parse a CSV file
    ///
    /// # Errors
    /// - FileNotFound: path does not exist
    /// - MissingColumn: a `required` column is absent from the header
    pub fn parse(path: &Path, required: &[&str]) -> ImportResult<Vec<RawRow>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for column in required {
            if !headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn {
                    file: path.display().to_string(),
                    column: column.to_string(),
                });
            }
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let values: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(record.iter().map(|v| v.trim().to_string()))
                .collect();

            if values.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                line: idx + 2,
                values,
            });
        }

        Ok(rows)
    }
}
