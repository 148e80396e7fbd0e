//! Whole-entry read operations.

use std::io::Read;
use std::io::{self};

use log::trace;

use super::Archive;
use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::CodecError;
use crate::codec::CodecReader;
use crate::text;
use crate::types::EntryInfo;

impl Archive {
    /// Lists every entry in central-directory order.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for writer handles, `Closed` after close, or
    /// `Read` if a directory record cannot be parsed.
    pub fn entries(&self) -> Result<Vec<EntryInfo>> {
        let state = self.shared.read();
        let mut reader = state.reader()?.clone();
        (0..reader.len())
            .map(|index| {
                codec::entry_info_at(&mut reader, index)
                    .map_err(|source| ArchiveError::Read { name: None, source })
            })
            .collect()
    }

    /// Returns the number of entries.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for writer handles or `Closed` after close.
    pub fn count(&self) -> Result<usize> {
        let state = self.shared.read();
        Ok(state.reader()?.len())
    }

    /// Returns `true` if an entry with exactly this name exists. The
    /// lookup is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for writer handles or `Closed` after close.
    pub fn has_entry(&self, name: &str) -> Result<bool> {
        let state = self.shared.read();
        Ok(state.reader()?.index_for_name(name).is_some())
    }

    /// Returns the metadata of one entry without reading its content.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if there is no such entry.
    pub fn entry_info(&self, name: &str) -> Result<EntryInfo> {
        let state = self.shared.read();
        let mut reader = state.reader()?.clone();
        let index = locate(&reader, name)?;
        codec::entry_info_at(&mut reader, index).map_err(|source| ArchiveError::Read {
            name: Some(name.to_string()),
            source,
        })
    }

    /// Reads a whole entry into memory.
    ///
    /// The declared size is checked against the allocation limit before
    /// anything is allocated, and the actual size is checked while
    /// reading. Encrypted entries are opened with the archive password.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if there is no such entry, `SizeLimit` if
    /// the entry is larger than the allocation limit, `Decryption` if an
    /// encrypted entry cannot be opened, or `Read` on codec failure.
    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let state = self.shared.read();
        let mut reader = state.reader()?.clone();
        let index = locate(&reader, name)?;
        let info = codec::entry_info_at(&mut reader, index).map_err(|source| ArchiveError::Read {
            name: Some(name.to_string()),
            source,
        })?;
        if info.size == 0 {
            return Ok(Vec::new());
        }

        let max = self.shared.max_allocation_size();
        if info.size > max {
            return Err(ArchiveError::SizeLimit {
                name: Some(name.to_string()),
                size: info.size,
                max,
            });
        }

        let read_error = |source: CodecError| ArchiveError::Read {
            name: Some(name.to_string()),
            source,
        };
        let mut entry = codec::open_entry(&mut reader, index, state.password.as_deref())
            .map_err(|source| open_failure(&info, source))?;

        let mut data = Vec::new();
        data.try_reserve_exact(usize::try_from(info.size).unwrap_or(usize::MAX))
            .map_err(|e| read_error(io::Error::new(io::ErrorKind::OutOfMemory, e).into()))?;
        entry
            .by_ref()
            .take(max.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| read_error(e.into()))?;

        let size = data.len() as u64;
        if size > max {
            return Err(ArchiveError::SizeLimit {
                name: Some(name.to_string()),
                size,
                max,
            });
        }
        trace!("read {size} bytes from {name:?}");
        Ok(data)
    }

    /// Reads a whole entry and decodes it as text. `encoding` is a WHATWG
    /// label and defaults to UTF-8.
    ///
    /// # Errors
    ///
    /// Everything [`read_bytes`](Self::read_bytes) returns, plus
    /// `Encoding` if the content cannot be decoded.
    pub fn read_text(&self, name: &str, encoding: Option<&str>) -> Result<String> {
        let bytes = self.read_bytes(name)?;
        text::decode(&bytes, encoding)
    }
}

/// Finds an entry by exact name.
pub(crate) fn locate(reader: &CodecReader, name: &str) -> Result<usize> {
    reader
        .index_for_name(name)
        .ok_or_else(|| ArchiveError::EntryNotFound {
            name: name.to_string(),
        })
}

/// Classifies a failure to open an entry for reading.
pub(crate) fn open_failure(info: &EntryInfo, source: CodecError) -> ArchiveError {
    if info.is_encrypted {
        ArchiveError::Decryption {
            name: info.name.clone(),
            source,
        }
    } else {
        ArchiveError::Read {
            name: Some(info.name.clone()),
            source,
        }
    }
}
