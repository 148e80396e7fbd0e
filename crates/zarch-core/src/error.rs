//! Error types for archive handle and streaming operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;
use crate::security::PathViolation;
use crate::types::ArchiveMode;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

fn describe(name: Option<&str>) -> String {
    name.map_or_else(|| "archive".to_string(), |name| format!("entry '{name}'"))
}

/// Errors that can occur while working with an archive handle or one of its
/// streaming sessions.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive could not be opened or created.
    #[error("failed to open archive {target}: {source}")]
    Open {
        /// File path, or `<memory>` for in-memory archives.
        target: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The handle has no reader (or writer) for the requested access.
    #[error("archive is not open for {access}")]
    NotOpen {
        /// Either `"reading"` or `"writing"`.
        access: &'static str,
    },

    /// The handle has been closed or finalized.
    #[error("archive is closed")]
    Closed,

    /// The operation is restricted to a mode this handle was not opened in.
    #[error("{operation} is not available for archives opened in {mode} mode")]
    InvalidMode {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Mode of the handle.
        mode: ArchiveMode,
    },

    /// Streaming sessions are still open on the handle.
    #[error("archive has {active} active stream(s)")]
    Busy {
        /// Number of outstanding sessions.
        active: usize,
    },

    /// No entry with the given name exists.
    #[error("entry '{name}' not found")]
    EntryNotFound {
        /// Requested entry name.
        name: String,
    },

    /// Reading the archive directory or an entry failed.
    #[error("failed to read {}: {source}", describe(.name.as_deref()))]
    Read {
        /// Entry name, or `None` for directory-level failures.
        name: Option<String>,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// Writing an entry or finalizing the archive failed.
    #[error("failed to write {}: {source}", describe(.name.as_deref()))]
    Write {
        /// Entry name, or `None` when the central directory could not be
        /// written.
        name: Option<String>,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// An encrypted entry could not be opened, usually a wrong or missing
    /// password.
    #[error("failed to decrypt entry '{name}' (wrong password?): {source}")]
    Decryption {
        /// Entry name.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// A declared or actual size exceeds the allocation limit.
    #[error("{} size {size} exceeds maximum allocation size {max}", describe(.name.as_deref()))]
    SizeLimit {
        /// Entry name, or `None` for the finalized archive buffer.
        name: Option<String>,
        /// Offending size in bytes.
        size: u64,
        /// Configured limit in bytes.
        max: u64,
    },

    /// Text could not be converted to or from the requested encoding.
    #[error("encoding error ({encoding}): {reason}")]
    Encoding {
        /// Encoding label as supplied by the caller.
        encoding: String,
        /// What went wrong.
        reason: String,
    },

    /// An entry name would escape the extraction root.
    #[error("unsafe entry name '{name}': {violation}")]
    PathSecurity {
        /// Offending entry name.
        name: String,
        /// Which rule rejected it.
        violation: PathViolation,
    },

    /// Writing extracted content to the filesystem failed.
    #[error("failed to extract to {}: {source}", .path.display())]
    Extraction {
        /// Filesystem path being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: CodecError,
    },

    /// A streaming session is not usable, or could not be opened or closed.
    #[error("stream error on entry '{name}': {reason}")]
    Stream {
        /// Entry bound to the session.
        name: String,
        /// What went wrong.
        reason: &'static str,
        /// Underlying codec failure, if any.
        #[source]
        source: Option<CodecError>,
    },

    /// Reading from an input stream failed.
    #[error("error reading entry '{name}': {source}")]
    StreamRead {
        /// Entry bound to the session.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// Writing to an output stream failed.
    #[error("error writing to entry '{name}': {source}")]
    StreamWrite {
        /// Entry bound to the session.
        name: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The operation is permanently unsupported.
    #[error("{operation} is not supported; {hint}")]
    NotSupported {
        /// Name of the rejected operation.
        operation: &'static str,
        /// What to do instead.
        hint: &'static str,
    },
}

impl ArchiveError {
    /// Returns `true` if this error was raised to protect the caller from a
    /// hostile archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use zarch_core::ArchiveError;
    /// use zarch_core::security::PathViolation;
    ///
    /// let err = ArchiveError::PathSecurity {
    ///     name: "../etc/passwd".into(),
    ///     violation: PathViolation::ParentTraversal,
    /// };
    /// assert!(err.is_security_violation());
    /// assert!(!ArchiveError::Closed.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathSecurity { .. } | Self::SizeLimit { .. })
    }

    /// Returns the numeric codec code of the underlying failure, if any.
    #[must_use]
    pub fn codec_code(&self) -> Option<i32> {
        match self {
            Self::Open { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::Decryption { source, .. }
            | Self::Extraction { source, .. }
            | Self::StreamRead { source, .. }
            | Self::StreamWrite { source, .. } => Some(source.code()),
            Self::Stream { source, .. } => source.as_ref().map(CodecError::code),
            _ => None,
        }
    }

    /// Returns the entry name this error refers to, if any.
    #[must_use]
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::EntryNotFound { name }
            | Self::Decryption { name, .. }
            | Self::PathSecurity { name, .. }
            | Self::Stream { name, .. }
            | Self::StreamRead { name, .. }
            | Self::StreamWrite { name, .. } => Some(name),
            Self::Read { name, .. } | Self::Write { name, .. } | Self::SizeLimit { name, .. } => {
                name.as_deref()
            }
            _ => None,
        }
    }
}
