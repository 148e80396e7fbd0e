//! Archive handle configuration.

use std::fmt;

/// Default cap on any single in-memory materialization (1 GiB).
pub const DEFAULT_MAX_ALLOCATION_SIZE: u64 = 1024 * 1024 * 1024;

/// Default initial capacity of an in-memory write buffer (128 KiB).
pub const DEFAULT_MEMORY_GROW_SIZE: usize = 128 * 1024;

/// Configuration applied when an archive handle is opened.
///
/// # Examples
///
/// ```
/// use zarch_core::ArchiveConfig;
///
/// let config = ArchiveConfig {
///     max_allocation_size: 64 * 1024 * 1024, // 64 MB
///     ..Default::default()
/// };
/// assert!(config.password.is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Largest entry (declared or actual size) that `read_bytes` will
    /// materialize, and largest buffer `finalize` will return.
    pub max_allocation_size: u64,

    /// Capacity reserved up front for in-memory write archives.
    pub memory_grow_size: usize,

    /// Archive-level password used to open encrypted entries.
    pub password: Option<String>,
}

impl Default for ArchiveConfig {
    /// Default values:
    /// - `max_allocation_size`: 1 GiB
    /// - `memory_grow_size`: 128 KiB
    /// - `password`: none
    fn default() -> Self {
        Self {
            max_allocation_size: DEFAULT_MAX_ALLOCATION_SIZE,
            memory_grow_size: DEFAULT_MEMORY_GROW_SIZE,
            password: None,
        }
    }
}

impl ArchiveConfig {
    /// Returns the configured password if it is non-empty.
    #[must_use]
    pub fn effective_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

// Passwords never end up in logs.
impl fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("max_allocation_size", &self.max_allocation_size)
            .field("memory_grow_size", &self.memory_grow_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
