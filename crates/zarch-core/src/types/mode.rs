//! Archive handle modes.

use std::fmt;

/// How an archive handle was opened.
///
/// `Read`, `Write` and `Append` are file-backed; the memory modes operate on
/// an owned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveMode {
    /// Existing archive file opened for reading.
    Read,
    /// New (or truncated) archive file opened for writing.
    Write,
    /// Existing archive file opened for appending entries.
    Append,
    /// Read-only archive parsed from a byte buffer.
    MemoryRead,
    /// Write-only archive built in a growable buffer.
    MemoryWrite,
}

impl ArchiveMode {
    /// Returns `true` if the handle holds a reader in this mode.
    #[must_use]
    pub const fn is_reader(self) -> bool {
        matches!(self, Self::Read | Self::MemoryRead)
    }

    /// Returns `true` if the handle holds a writer in this mode.
    #[must_use]
    pub const fn is_writer(self) -> bool {
        !self.is_reader()
    }

    /// Returns `true` for in-memory modes.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::MemoryRead | Self::MemoryWrite)
    }
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Append => "append",
            Self::MemoryRead => "memory-read",
            Self::MemoryWrite => "memory-write",
        };
        f.write_str(name)
    }
}
