//! Error taxonomy for the conversion core (see spec §7).

use thiserror::Error;

/// Errors surfaced by every codec in this crate.
///
/// Parse-side variants always carry the byte offset at which the
/// problem was detected. Build-side variants are checked eagerly and
/// fail before any output is produced.
#[derive(Debug, Error)]
pub enum IsisError {
    /// A parsed byte stream violates one of the invariants in the data
    /// model (leader/directory mismatch, non-digit in a numeric field,
    /// missing terminator, ...).
    #[error("format error at offset {offset}: {message}")]
    Format { message: String, offset: usize },

    /// End of stream reached in the middle of a record.
    #[error("truncated record at offset {offset}: {message}")]
    Truncated { message: String, offset: usize },

    /// A build input does not fit the configured geometry.
    #[error("overflow building field `{field}`: {message}")]
    Overflow { field: String, message: String },

    /// Transcoding failed under the configured character set.
    #[error("encoding error: {message}")]
    Encoding { message: String },

    /// An XRF pointer is out of range, or XRF length is inconsistent
    /// with the MST's record count.
    #[error("xrf error{}: {message}", mfn.map(|m| format!(" (mfn {m})")).unwrap_or_default())]
    Xrf { message: String, mfn: Option<u32> },

    /// Underlying stream I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IsisError {
    pub fn format(message: impl Into<String>, offset: usize) -> Self {
        IsisError::Format { message: message.into(), offset }
    }

    pub fn truncated(message: impl Into<String>, offset: usize) -> Self {
        IsisError::Truncated { message: message.into(), offset }
    }

    pub fn overflow(field: impl Into<String>, message: impl Into<String>) -> Self {
        IsisError::Overflow { field: field.into(), message: message.into() }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        IsisError::Encoding { message: message.into() }
    }

    pub fn xrf(message: impl Into<String>, mfn: Option<u32>) -> Self {
        IsisError::Xrf { message: message.into(), mfn }
    }
}

pub type Result<T> = std::result::Result<T, IsisError>;
