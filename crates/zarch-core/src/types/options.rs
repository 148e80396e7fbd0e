//! Per-call add and extract options.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use super::CompressionMethod;

/// Options for adding an entry.
///
/// Every field applies to the single entry being written; nothing carries
/// over to later entries on the same handle.
///
/// # Examples
///
/// ```
/// use zarch_core::AddOptions;
/// use zarch_core::CompressionMethod;
///
/// let options = AddOptions {
///     compression_method: CompressionMethod::Stored,
///     password: Some("s3cret".into()),
///     ..Default::default()
/// };
/// assert_eq!(options.encryption_password(), Some("s3cret"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Compression method, deflate by default.
    pub compression_method: CompressionMethod,

    /// Compression level, or `None` for the codec default. Ignored for
    /// stored entries.
    pub compression_level: Option<i64>,

    /// Non-empty password enables AES-256 encryption for this entry.
    pub password: Option<String>,

    /// Entry comment.
    pub comment: Option<String>,

    /// Modification time, the current time when absent.
    pub modified: Option<DateTime<Utc>>,
}

impl AddOptions {
    /// Shorthand for options using the given compression method.
    #[must_use]
    pub fn with_method(method: CompressionMethod) -> Self {
        Self {
            compression_method: method,
            ..Self::default()
        }
    }

    /// Returns the password if it enables encryption.
    #[must_use]
    pub fn encryption_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Returns the level that should reach the codec.
    #[must_use]
    pub fn effective_level(&self) -> Option<i64> {
        if self.compression_method == CompressionMethod::Stored {
            None
        } else {
            self.compression_level
        }
    }
}

impl fmt::Debug for AddOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddOptions")
            .field("compression_method", &self.compression_method)
            .field("compression_level", &self.compression_level)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("comment", &self.comment)
            .field("modified", &self.modified)
            .finish()
    }
}

/// Options for bulk extraction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Password for encrypted entries; falls back to the archive-level
    /// password when absent.
    pub password: Option<String>,
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AddOptions::default();
        assert_eq!(options.compression_method, CompressionMethod::Deflated);
        assert_eq!(options.compression_level, None);
        assert_eq!(options.encryption_password(), None);
        assert!(options.modified.is_none());
    }

    #[test]
    fn test_empty_password_disables_encryption() {
        let options = AddOptions {
            password: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(options.encryption_password(), None);
    }

    #[test]
    fn test_stored_drops_level() {
        let options = AddOptions {
            compression_method: CompressionMethod::Stored,
            compression_level: Some(9),
            ..Default::default()
        };
        assert_eq!(options.effective_level(), None);

        let options = AddOptions {
            compression_level: Some(9),
            ..Default::default()
        };
        assert_eq!(options.effective_level(), Some(9));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let add = AddOptions {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{add:?}").contains("hunter2"));

        let extract = ExtractOptions {
            password: Some("hunter2".into()),
        };
        assert!(!format!("{extract:?}").contains("hunter2"));
    }
}
