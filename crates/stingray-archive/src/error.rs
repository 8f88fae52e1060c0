//! Error types for workspace operations

use stingray_formats::payload::PayloadError;
use stingray_formats::toc::{EntryKey, TocError};
use thiserror::Error;

/// Workspace operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised by workspace operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The operation edits the active patch but none is active
    #[error("No patch is active, create or select one first")]
    NoPatch,

    /// The operation needs an active archive but none is loaded
    #[error("No archive is active, load one first")]
    NoArchive,

    /// The entry exists but not in the active patch
    #[error("Entry {0} is not in the active patch")]
    NotInPatch(EntryKey),

    /// No loaded container holds the entry
    #[error("Entry {0} not found")]
    EntryNotFound(EntryKey),

    /// The entry decoded to a different payload kind than the operation needs
    #[error("Entry {key} does not hold a {expected} payload")]
    UnexpectedPayload {
        key: EntryKey,
        expected: &'static str,
    },

    /// Container codec error
    #[error("Container error: {0}")]
    Toc(#[from] TocError),

    /// Payload codec error
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Hash-name list error
    #[error("Name list error: {0}")]
    Names(#[from] stingray_hash::HashError),

    /// Configuration file could not be read or written
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Check if the error is a missing precondition rather than a data problem
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NoPatch | Self::NoArchive | Self::NotInPatch(_))
    }

    /// Check if the error is a recognised but unsupported payload type
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::Payload(e) if e.is_unknown_type())
    }
}

/// Outcome of an operation applied to several items
///
/// Every item is attempted; failures are collected instead of aborting.
#[derive(Debug, Default)]
pub struct BatchReport<K> {
    /// Items that completed
    pub succeeded: Vec<K>,
    /// Items that failed, with their error
    pub failures: Vec<(K, ArchiveError)>,
}

impl<K> BatchReport<K> {
    /// Empty report
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record the result of one item
    pub fn record(&mut self, item: K, result: ArchiveResult<()>) {
        match result {
            Ok(()) => self.succeeded.push(item),
            Err(e) => self.failures.push((item, e)),
        }
    }

    /// Whether no item failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of items attempted
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }
}
