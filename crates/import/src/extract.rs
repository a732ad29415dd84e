//! Document extraction: uploaded bytes to string-valued field maps.
//!
//! Extraction reports failures as data ([`ExtractionStatus::Error`] plus
//! details) rather than as a Rust error. The engine turns an error
//! extraction into a single run-level ingestion failure.

use serde::Serialize;

/// Ordered `(column, value)` pairs for one input row.
pub type FieldMap = Vec<(String, String)>;

pub const CSV_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "text/plain",
    "application/vnd.ms-excel",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub status: ExtractionStatus,
    pub output: Vec<FieldMap>,
    /// Human-readable failure description; `None` on success.
    pub details: Option<String>,
}

impl Extraction {
    pub fn success(output: Vec<FieldMap>) -> Self {
        Self {
            status: ExtractionStatus::Success,
            output,
            details: None,
        }
    }

    pub fn error(details: impl Into<String>) -> Self {
        Self {
            status: ExtractionStatus::Error,
            output: Vec::new(),
            details: Some(details.into()),
        }
    }
}

pub trait DocumentExtractor: Send + Sync {
    /// Extract rows from `bytes`. `content_type` is the declared MIME
    /// type, if the caller knows it.
    fn extract(&self, bytes: &[u8], content_type: Option<&str>) -> Extraction;
}

/// UTF-8 CSV with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl DocumentExtractor for CsvExtractor {
    fn extract(&self, bytes: &[u8], content_type: Option<&str>) -> Extraction {
        if let Some(declared) = content_type {
            let essence = declared.split(';').next().unwrap_or_default().trim();
            if !CSV_CONTENT_TYPES.contains(&essence.to_ascii_lowercase().as_str()) {
                return Extraction::error(format!(
                    "Unsupported file type '{essence}'. Upload a CSV file."
                ));
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => return Extraction::error(format!("Could not read CSV header: {e}")),
        };
        if headers.iter().all(|h| h.is_empty()) {
            return Extraction::error("The file has no header row.");
        }

        let mut output = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                // Header is line 1.
                Err(e) => {
                    return Extraction::error(format!("Could not read CSV line {}: {e}", idx + 2))
                }
            };
            if record.iter().all(str::is_empty) {
                continue;
            }
            let fields: FieldMap = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect();
            output.push(fields);
        }

        Extraction::success(output)
    }
}
