//! CSV column extraction, directly or from inside a ZIP archive.

use std::path::Path;
use tracing::info;

use crate::files::{self, FileKind};

/// Extract the requested column's first-row value from an uploaded file.
///
/// Archives are searched recursively for the first `.csv` entry in walk
/// order. Column lookup is exact first, then case-insensitive; a miss
/// reports the available columns.
pub fn extract_from_file(path: &Path, column: &str) -> String {
    match files::detect_kind(path) {
        FileKind::Archive => extract_from_zip(path, column),
        FileKind::Csv => extract_from_csv(path, column),
        _ => "Unsupported file format. Please provide a ZIP or CSV file.".to_string(),
    }
}

/// Extract from the first CSV found inside a ZIP archive.
pub fn extract_from_zip(zip_path: &Path, column: &str) -> String {
    let extracted = match files::extract_zip(zip_path) {
        Ok(dir) => dir,
        Err(e) => return format!("Error extracting from ZIP: {}", e),
    };

    match files::find_file_by_extension(extracted.path(), ".csv") {
        Some(csv_path) => {
            info!("Found CSV in archive: {}", csv_path.display());
            extract_from_csv(&csv_path, column)
        }
        None => "No CSV file found in the ZIP archive.".to_string(),
    }
}

/// Return the first row's value in the requested column.
pub fn extract_from_csv(csv_path: &Path, column: &str) -> String {
    // Decode with the fixed encoding priority before parsing
    let text = match files::read_text(csv_path) {
        Ok(text) => text,
        Err(e) => return format!("Error reading CSV file: {}", e),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => return format!("Error reading CSV file: {}", e),
    };

    let index = headers
        .iter()
        .position(|h| h == column)
        .or_else(|| {
            let lower = column.to_lowercase();
            headers.iter().position(|h| h.to_lowercase() == lower)
        });

    let Some(index) = index else {
        let columns: Vec<&str> = headers.iter().collect();
        return format!(
            "Column '{}' not found. Available columns: {}",
            column,
            columns.join(", ")
        );
    };

    match reader.records().next() {
        Some(Ok(record)) => record
            .get(index)
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("Error reading CSV file: row has no column {}", index)),
        Some(Err(e)) => format!("Error reading CSV file: {}", e),
        None => "Error reading CSV file: no data rows".to_string(),
    }
}
