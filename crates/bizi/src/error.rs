use thiserror::Error as ThisError;

/// Errors that abort an aggregation pass.
///
/// Neither variant is recoverable: the pass stops at the first failure and
/// no partially aggregated records are handed back.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// A record that does not have the expected shape, e.g. too few fields or
    /// a station id that is not an integer.
    #[error("malformed record on line {line} ({reason}): '{record}'")]
    Format {
        line: u64,
        record: String,
        reason: String,
    },
    /// The input could not be opened, or reading from it failed midway.
    #[error("could not read usage data from {path} due to: {error}")]
    SourceUnavailable { path: String, error: String },
}

impl IngestError {
    pub(crate) fn format(line: u64, record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            record: record.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn source_unavailable(path: impl Into<String>, error: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Returns true for failures caused by the content of the input rather
    /// than by access to it.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
