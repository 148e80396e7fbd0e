//! The archive handle.
//!
//! An [`Archive`] owns exactly one codec reader or writer, chosen by how it
//! was opened (see [`ArchiveMode`]). It is `Send + Sync`: operations that
//! only read take a shared lock, operations that mutate take an exclusive
//! lock, and each lock covers one call. Streaming sessions hold no lock
//! while the caller drives them; instead the handle counts them and
//! refuses to close or finalize while any are outstanding.

mod builder;
mod extract;
pub(crate) mod read;
pub(crate) mod shared;
mod write;

pub use builder::ArchiveBuilder;

use std::fmt;
use std::mem;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;

use log::debug;

use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::CodecError;
use crate::stream::InputStream;
use crate::stream::OutputStream;
use crate::types::AddOptions;
use crate::types::ArchiveMode;
use shared::Backend;
use shared::Shared;

/// A ZIP archive opened for reading or writing.
///
/// # Examples
///
/// ```
/// use zarch_core::AddOptions;
/// use zarch_core::Archive;
///
/// # fn main() -> Result<(), zarch_core::ArchiveError> {
/// let writer = Archive::in_memory()?;
/// writer.add_text("hello.txt", "hello", None, &AddOptions::default())?;
/// let bytes = writer.finalize()?;
///
/// let reader = Archive::from_bytes(bytes)?;
/// assert_eq!(reader.read_text("hello.txt", None)?, "hello");
/// # Ok(())
/// # }
/// ```
pub struct Archive {
    shared: Arc<Shared>,
    mode: ArchiveMode,
    path: Option<PathBuf>,
}

impl Archive {
    pub(crate) fn from_parts(
        backend: Backend,
        mode: ArchiveMode,
        path: Option<PathBuf>,
        password: Option<String>,
        max_allocation_size: u64,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(backend, password, max_allocation_size)),
            mode,
            path,
        }
    }

    /// Returns a builder for non-default configuration.
    #[must_use]
    pub fn builder() -> ArchiveBuilder {
        ArchiveBuilder::new()
    }

    /// Opens an existing archive file for reading.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the file is missing, unreadable or
    /// not a valid archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ArchiveBuilder::new().open(path)
    }

    /// Creates (or truncates) an archive file for writing.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        ArchiveBuilder::new().create(path)
    }

    /// Opens an archive file for appending entries.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` on I/O or format failure.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        ArchiveBuilder::new().append(path)
    }

    /// Opens an archive file for writing, appending to it when `append` is
    /// set and truncating it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` on I/O or format failure.
    pub fn open_for_write(path: impl AsRef<Path>, append: bool) -> Result<Self> {
        if append {
            Self::append(path)
        } else {
            Self::create(path)
        }
    }

    /// Parses a complete archive from a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the bytes are not a valid archive.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        ArchiveBuilder::new().from_bytes(bytes)
    }

    /// Starts an empty archive in memory. Retrieve it with
    /// [`finalize`](Self::finalize).
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Open` if the initial buffer cannot be
    /// allocated.
    pub fn in_memory() -> Result<Self> {
        ArchiveBuilder::new().in_memory()
    }

    /// Returns the mode the handle was opened in.
    #[must_use]
    pub const fn mode(&self) -> ArchiveMode {
        self.mode
    }

    /// Returns the backing file, `None` for in-memory archives.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns `true` once the handle has been closed or finalized.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.read().is_closed()
    }

    /// Returns the number of streaming sessions still open.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.shared.sessions()
    }

    /// Returns the allocation limit for reads and finalize.
    #[must_use]
    pub fn max_allocation_size(&self) -> u64 {
        self.shared.max_allocation_size()
    }

    /// Changes the allocation limit for subsequent calls.
    pub fn set_max_allocation_size(&self, max: u64) {
        self.shared.set_max_allocation_size(max);
    }

    /// Sets or clears the archive-level password used to open encrypted
    /// entries. An empty password clears it.
    pub fn set_password(&self, password: Option<&str>) {
        let password = password.filter(|p| !p.is_empty()).map(str::to_string);
        self.shared.write().password = password;
    }

    /// Returns the archive comment.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for writer handles and `Closed` after close.
    pub fn comment(&self) -> Result<String> {
        let state = self.shared.read();
        Ok(codec::archive_comment(state.reader()?))
    }

    /// Sets the comment written with the central directory.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for reader handles and `Closed` after close.
    pub fn set_comment(&self, comment: &str) -> Result<()> {
        let mut state = self.shared.write();
        state.writer()?.set_comment(comment.to_string());
        Ok(())
    }

    /// Always fails: entries cannot be removed in place.
    ///
    /// # Errors
    ///
    /// Always returns `ArchiveError::NotSupported`.
    pub fn delete_entry(&self, name: &str) -> Result<()> {
        debug!("refusing to delete entry {name:?}");
        Err(ArchiveError::NotSupported {
            operation: "delete",
            hint: "rebuild the archive without the entry",
        })
    }

    /// Opens an entry for incremental reading.
    ///
    /// The session counts against the handle until it is closed or
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for writer handles, `EntryNotFound` if the entry
    /// does not exist, `Decryption` if an encrypted entry cannot be opened,
    /// or `Stream` for other open failures.
    pub fn open_input_stream(&self, name: &str) -> Result<InputStream> {
        InputStream::open(&self.shared, name)
    }

    /// Starts a new entry to be filled incrementally.
    ///
    /// Until the returned stream is closed, other entry writes on this
    /// handle fail with `Busy`.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for reader handles, `Busy` if another output
    /// stream is open, or `Stream` if the codec refuses the entry.
    pub fn open_output_stream(&self, name: &str, options: &AddOptions) -> Result<OutputStream> {
        OutputStream::open(&self.shared, name, options)
    }

    /// Closes the handle, writing the central directory for writers.
    ///
    /// Closing an already closed handle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while streaming sessions are open, or `Write` if the
    /// central directory cannot be written. The handle is closed in the
    /// latter case.
    pub fn close(&self) -> Result<()> {
        let mut state = self.shared.write();
        if state.is_closed() {
            return Ok(());
        }
        let active = self.shared.sessions();
        if active > 0 {
            return Err(ArchiveError::Busy { active });
        }

        state.writing_stream = None;
        if let Backend::Writer(writer) = mem::replace(&mut state.backend, Backend::Closed) {
            writer
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .finish()
                .map_err(|e| ArchiveError::Write {
                    name: None,
                    source: CodecError::from(e),
                })?;
        }
        debug!("closed {} archive", self.mode);
        Ok(())
    }

    /// Finishes an in-memory archive and returns its bytes.
    ///
    /// The handle is closed afterwards whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMode` unless the handle was created with
    /// [`in_memory`](Self::in_memory), `Closed` if it was already closed,
    /// `Busy` while streaming sessions are open, `Write` if the central
    /// directory cannot be written, or `SizeLimit` if the archive is
    /// larger than the allocation limit.
    pub fn finalize(&self) -> Result<Vec<u8>> {
        if self.mode != ArchiveMode::MemoryWrite {
            return Err(ArchiveError::InvalidMode {
                operation: "finalize",
                mode: self.mode,
            });
        }

        let mut state = self.shared.write();
        if state.is_closed() {
            return Err(ArchiveError::Closed);
        }
        let active = self.shared.sessions();
        if active > 0 {
            return Err(ArchiveError::Busy { active });
        }

        state.writing_stream = None;
        let Backend::Writer(writer) = mem::replace(&mut state.backend, Backend::Closed) else {
            return Err(ArchiveError::Closed);
        };
        let sink = writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .finish()
            .map_err(|e| ArchiveError::Write {
                name: None,
                source: CodecError::from(e),
            })?;
        let bytes = sink.into_bytes().ok_or(ArchiveError::InvalidMode {
            operation: "finalize",
            mode: self.mode,
        })?;

        let size = bytes.len() as u64;
        let max = self.shared.max_allocation_size();
        if size > max {
            return Err(ArchiveError::SizeLimit {
                name: None,
                size,
                max,
            });
        }
        debug!("finalized in-memory archive ({size} bytes)");
        Ok(bytes)
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .field("active_sessions", &self.active_sessions())
            .finish_non_exhaustive()
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        // Sessions still open keep the shared state alive; the writer is
        // then finished when the last of them goes away.
        let _ = self.close();
    }
}
