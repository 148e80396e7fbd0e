//! Builder for opening archive handles.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Cursor;
use std::io::{self};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use log::debug;

use super::Archive;
use super::shared::Backend;
use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::ArchiveSink;
use crate::codec::ArchiveSource;
use crate::codec::CodecError;
use crate::codec::SharedFile;
use crate::types::ArchiveMode;

const MEMORY_TARGET: &str = "<memory>";

/// Builder for configuring and opening an [`Archive`].
///
/// # Examples
///
/// ```no_run
/// use zarch_core::ArchiveBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = ArchiveBuilder::new()
///     .max_allocation_size(16 * 1024 * 1024)
///     .password("s3cret")
///     .open("bundle.zip")?;
/// let manifest = archive.read_text("manifest.json", None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    config: ArchiveConfig,
}

impl ArchiveBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the largest buffer a single read or finalize may produce.
    #[must_use]
    pub const fn max_allocation_size(mut self, max: u64) -> Self {
        self.config.max_allocation_size = max;
        self
    }

    /// Sets the capacity reserved for in-memory write archives.
    #[must_use]
    pub const fn memory_grow_size(mut self, size: usize) -> Self {
        self.config.memory_grow_size = size;
        self
    }

    /// Sets the archive-level password used to read encrypted entries.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Opens an existing archive file for reading.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the file is missing, unreadable or
    /// not a valid archive.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Archive> {
        let path = path.as_ref();
        let open_error = |source: CodecError| ArchiveError::Open {
            target: path.display().to_string(),
            source,
        };

        let file = SharedFile::open(path).map_err(|e| open_error(e.into()))?;
        let reader = codec::open_reader(ArchiveSource::File(file)).map_err(open_error)?;
        debug!(
            "opened {} for reading ({} entries)",
            path.display(),
            reader.len()
        );

        Ok(self.finish(Backend::Reader(reader), ArchiveMode::Read, Some(path)))
    }

    /// Creates (or truncates) an archive file for writing.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the file cannot be created.
    pub fn create(self, path: impl AsRef<Path>) -> Result<Archive> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ArchiveError::Open {
            target: path.display().to_string(),
            source: e.into(),
        })?;
        let writer = codec::open_writer(ArchiveSink::File(file), false).map_err(|source| {
            ArchiveError::Open {
                target: path.display().to_string(),
                source,
            }
        })?;
        debug!("created {} for writing", path.display());

        Ok(self.finish(
            Backend::Writer(Mutex::new(writer)),
            ArchiveMode::Write,
            Some(path),
        ))
    }

    /// Opens an archive file for appending entries.
    ///
    /// A missing or empty file starts a new archive.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the file cannot be opened or holds
    /// something other than a valid archive.
    pub fn append(self, path: impl AsRef<Path>) -> Result<Archive> {
        let path = path.as_ref();
        let open_error = |source: CodecError| ArchiveError::Open {
            target: path.display().to_string(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| open_error(e.into()))?;
        let existing = file.metadata().map_err(|e| open_error(e.into()))?.len() > 0;
        let writer = codec::open_writer(ArchiveSink::File(file), existing).map_err(open_error)?;
        debug!(
            "opened {} for appending (existing archive: {existing})",
            path.display()
        );

        Ok(self.finish(
            Backend::Writer(Mutex::new(writer)),
            ArchiveMode::Append,
            Some(path),
        ))
    }

    /// Parses a complete archive held in memory.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the bytes are not a valid archive.
    pub fn from_bytes(self, bytes: impl Into<Arc<[u8]>>) -> Result<Archive> {
        let reader =
            codec::open_reader(ArchiveSource::memory(bytes)).map_err(|source| ArchiveError::Open {
                target: MEMORY_TARGET.to_string(),
                source,
            })?;
        debug!("opened in-memory archive ({} entries)", reader.len());

        Ok(self.finish(Backend::Reader(reader), ArchiveMode::MemoryRead, None))
    }

    /// Starts an empty archive in a growable buffer.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the initial buffer cannot be
    /// allocated.
    pub fn in_memory(self) -> Result<Archive> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve(self.config.memory_grow_size)
            .map_err(|e| ArchiveError::Open {
                target: MEMORY_TARGET.to_string(),
                source: CodecError::Io(io::Error::new(io::ErrorKind::OutOfMemory, e)),
            })?;
        let writer =
            codec::open_writer(ArchiveSink::Memory(Cursor::new(buffer)), false).map_err(|source| {
                ArchiveError::Open {
                    target: MEMORY_TARGET.to_string(),
                    source,
                }
            })?;
        debug!(
            "created in-memory archive ({} bytes reserved)",
            self.config.memory_grow_size
        );

        Ok(self.finish(
            Backend::Writer(Mutex::new(writer)),
            ArchiveMode::MemoryWrite,
            None,
        ))
    }

    fn finish(self, backend: Backend, mode: ArchiveMode, path: Option<&Path>) -> Archive {
        let password = self.config.effective_password().map(str::to_string);
        Archive::from_parts(
            backend,
            mode,
            path.map(Path::to_path_buf),
            password,
            self.config.max_allocation_size,
        )
    }
}
