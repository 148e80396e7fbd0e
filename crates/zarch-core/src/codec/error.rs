//! Normalized codec failures.

use std::io;

use thiserror::Error;
use zip::result::ZipError;

/// A failure reported by the archive codec.
///
/// Each variant maps to a stable negative numeric code (see [`code`]) so
/// callers can log or forward the codec's diagnosis unchanged.
///
/// [`code`]: CodecError::code
#[derive(Error, Debug)]
pub enum CodecError {
    /// I/O failure, including CRC mismatches reported while inflating.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive structure is malformed.
    #[error("invalid archive: {0}")]
    Format(String),

    /// The archive uses a feature the codec cannot handle.
    #[error("unsupported archive: {0}")]
    Unsupported(String),

    /// The requested entry is not in the central directory.
    #[error("entry does not exist")]
    EntryMissing,

    /// The supplied password does not match the entry.
    #[error("invalid password")]
    Password,
}

impl CodecError {
    /// Generic stream or I/O failure.
    pub const STREAM: i32 = -1;
    /// Corrupt entry data.
    pub const DATA: i32 = -3;
    /// Malformed archive structure.
    pub const FORMAT: i32 = -103;
    /// Entry does not exist.
    pub const EXIST: i32 = -107;
    /// Wrong password.
    pub const PASSWORD: i32 = -108;
    /// Unsupported feature.
    pub const SUPPORT: i32 = -109;

    /// Returns the numeric code of this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Io(err) if err.kind() == io::ErrorKind::InvalidData => Self::DATA,
            Self::Io(_) => Self::STREAM,
            Self::Format(_) => Self::FORMAT,
            Self::Unsupported(_) => Self::SUPPORT,
            Self::EntryMissing => Self::EXIST,
            Self::Password => Self::PASSWORD,
        }
    }
}

impl From<ZipError> for CodecError {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Io(err) => Self::Io(err),
            ZipError::InvalidArchive(msg) => Self::Format(msg.to_string()),
            ZipError::UnsupportedArchive(msg) => Self::Unsupported(msg.to_string()),
            ZipError::FileNotFound => Self::EntryMissing,
            ZipError::InvalidPassword => Self::Password,
            other => Self::Format(other.to_string()),
        }
    }
}
