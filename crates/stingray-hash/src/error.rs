//! Error types for hash-name list handling

use thiserror::Error;

/// Result type for hash-name list operations
pub type HashResult<T> = Result<T, HashError>;

/// Errors raised while reading or writing hash-name lists
#[derive(Debug, Error)]
pub enum HashError {
    /// I/O error while accessing a list file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A list line did not have the `<hash> <name>` shape
    #[error("Malformed hash list line {line}: {content:?}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// Offending line content
        content: String,
    },

    /// A hash field could not be parsed as a number
    #[error("Invalid hash value {value:?} on line {line}")]
    InvalidHash {
        /// 1-based line number
        line: usize,
        /// Text that failed to parse
        value: String,
    },
}

impl HashError {
    /// Check if this error came from malformed list content rather than I/O
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::MalformedLine { .. } | Self::InvalidHash { .. })
    }
}
