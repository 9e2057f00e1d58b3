//! Bulk student import.
//!
//! The client checks the file type and size, uploads the file, and reconciles
//! the server's answer: every data row ends up imported, duplicate or in
//! error, and every row that was not imported is reported with its line
//! number so the operator can fix exactly that row.

mod file;
mod report;

pub use file::{
    check_type, count_data_rows, template_csv, ImportFile, ALLOWED_EXTENSIONS,
    DEFAULT_MAX_FILE_BYTES, TEMPLATE_HEADER,
};
pub use report::render;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::ClientError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file type: {0} (expected .xlsx, .xls, .csv or .txt)")]
    UnsupportedType(String),

    #[error("File is {size} bytes, larger than the {max} bytes allowed")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Upload(#[from] ClientError),
}

/// A row rejected because its matricule already exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    pub line: usize,
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub matricule: String,
    #[serde(default)]
    pub name: String,
}

/// A row rejected as malformed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRow {
    pub line: usize,
    #[serde(default, deserialize_with = "crate::models::string_or_number")]
    pub matricule: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDetails {
    #[serde(default)]
    pub duplicates: Vec<DuplicateRow>,
    #[serde(default)]
    pub errors: Vec<ErrorRow>,
}

/// Outcome of one import, as computed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: usize,
    #[serde(default)]
    pub details: ImportDetails,
}

/// An inconsistency between the counts and the rows they describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountingIssue {
    /// `imported + duplicates + errors` differs from the rows sent
    RowCount { expected: usize, reported: usize },
    /// A bucket's count differs from the number of detailed rows
    DetailCount {
        bucket: &'static str,
        count: usize,
        listed: usize,
    },
    /// A detailed row points outside the file
    LineOutOfRange { line: usize, total: usize },
}

impl std::fmt::Display for AccountingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountingIssue::RowCount { expected, reported } => write!(
                f,
                "{} rows sent but {} rows accounted for",
                expected, reported
            ),
            AccountingIssue::DetailCount {
                bucket,
                count,
                listed,
            } => write!(f, "{} {} reported but {} listed", count, bucket, listed),
            AccountingIssue::LineOutOfRange { line, total } => {
                write!(f, "line {} is outside the file (1..={})", line, total)
            }
        }
    }
}

impl ImportResult {
    /// Rows the server accounted for
    pub fn total(&self) -> usize {
        self.imported + self.duplicates + self.errors
    }

    /// Whether anything was not imported
    pub fn has_rejections(&self) -> bool {
        self.duplicates > 0 || self.errors > 0
    }

    /// Check the result against the number of data rows sent
    pub fn check_accounting(&self, total_rows: usize) -> Vec<AccountingIssue> {
        let mut issues = Vec::new();

        if self.total() != total_rows {
            issues.push(AccountingIssue::RowCount {
                expected: total_rows,
                reported: self.total(),
            });
        }
        for (bucket, count, listed) in [
            ("duplicates", self.duplicates, self.details.duplicates.len()),
            ("errors", self.errors, self.details.errors.len()),
        ] {
            if count != listed {
                issues.push(AccountingIssue::DetailCount {
                    bucket,
                    count,
                    listed,
                });
            }
        }

        let lines = self
            .details
            .duplicates
            .iter()
            .map(|d| d.line)
            .chain(self.details.errors.iter().map(|e| e.line));
        for line in lines {
            if line == 0 || line > total_rows {
                issues.push(AccountingIssue::LineOutOfRange {
                    line,
                    total: total_rows,
                });
            }
        }

        issues
    }
}

/// What closing the result view requires of the student list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    pub refresh: bool,
}

/// Result view state: holds the latest result until it is closed
#[derive(Debug, Default)]
pub struct ImportSession {
    result: Option<ImportResult>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `result`, checking it against the file when its rows are countable
    pub fn record(&mut self, result: ImportResult, total_rows: Option<usize>) {
        if let Some(total) = total_rows {
            for issue in result.check_accounting(total) {
                warn!(%issue, "Import result does not add up");
            }
        }
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&ImportResult> {
        self.result.as_ref()
    }

    /// Dismiss the result. The list must refresh only if rows were imported.
    pub fn close(&mut self) -> CloseOutcome {
        let refresh = self
            .result
            .take()
            .map(|r| r.imported > 0)
            .unwrap_or(false);
        debug!(refresh, "Import result closed");
        CloseOutcome { refresh }
    }
}
