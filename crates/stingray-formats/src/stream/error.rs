//! Error types for byte cursor operations

use thiserror::Error;

/// Byte cursor result type
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors raised by [`ByteStream`](super::ByteStream)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A read needed more bytes than the buffer holds
    #[error("Buffer underrun at offset {offset}: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        /// Position of the failed read
        offset: usize,
        /// Bytes the read needed
        needed: usize,
        /// Bytes left after `offset`
        available: usize,
    },

    /// A write was given a value of the wrong length
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Declared length
        expected: usize,
        /// Length of the supplied value
        actual: usize,
    },
}
