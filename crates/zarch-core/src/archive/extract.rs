//! Extraction to the filesystem.

use std::fs::File;
use std::fs::{self};
use std::io::{self};
use std::path::Path;

use filetime::FileTime;
use log::debug;
use log::warn;

use super::Archive;
use super::read::locate;
use super::read::open_failure;
use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::CodecReader;
use crate::security::validate_entry_name;
use crate::types::EntryInfo;
use crate::types::ExtractOptions;

impl Archive {
    /// Extracts every entry below `destination`.
    ///
    /// All entry names are validated before anything is written; one unsafe
    /// name aborts the whole call with nothing extracted. Symlink entries
    /// are written as regular files holding the link target. Modification
    /// times are restored on a best-effort basis.
    ///
    /// An I/O failure after validation leaves the entries extracted so far
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns `PathSecurity` for an unsafe entry name, `Decryption` if an
    /// encrypted entry cannot be opened, `Extraction` if writing fails,
    /// `NotOpen` for writer handles or `Closed` after close.
    pub fn extract_all(
        &self,
        destination: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<()> {
        let destination = destination.as_ref();
        let state = self.shared.read();
        let mut reader = state.reader()?.clone();
        let password = options
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(state.password.as_deref());

        let mut entries = Vec::with_capacity(reader.len());
        for index in 0..reader.len() {
            let info = codec::entry_info_at(&mut reader, index)
                .map_err(|source| ArchiveError::Read { name: None, source })?;
            validate_entry_name(&info.name)?;
            entries.push(info);
        }

        debug!(
            "extracting {} entries to {}",
            entries.len(),
            destination.display()
        );
        for (index, info) in entries.iter().enumerate() {
            let target = destination.join(&info.name);
            if info.is_directory {
                fs::create_dir_all(&target).map_err(|e| extraction_error(&target, e))?;
            } else {
                extract_file(&mut reader, index, info, &target, password)?;
            }
        }
        Ok(())
    }

    /// Extracts a single entry to the file `destination`.
    ///
    /// The entry name is validated first even though it does not choose the
    /// output path. Directory entries create `destination` as a directory.
    ///
    /// # Errors
    ///
    /// Returns `PathSecurity` for an unsafe entry name, `EntryNotFound` if
    /// the entry does not exist, `Decryption` if it cannot be decrypted
    /// with the archive password, or `Extraction` if writing fails.
    pub fn extract_entry(&self, name: &str, destination: impl AsRef<Path>) -> Result<()> {
        validate_entry_name(name)?;
        let destination = destination.as_ref();

        let state = self.shared.read();
        let mut reader = state.reader()?.clone();
        let index = locate(&reader, name)?;
        let info = codec::entry_info_at(&mut reader, index).map_err(|source| ArchiveError::Read {
            name: Some(name.to_string()),
            source,
        })?;

        if info.is_directory {
            fs::create_dir_all(destination).map_err(|e| extraction_error(destination, e))?;
            return Ok(());
        }
        extract_file(
            &mut reader,
            index,
            &info,
            destination,
            state.password.as_deref(),
        )
    }
}

fn extract_file(
    reader: &mut CodecReader,
    index: usize,
    info: &EntryInfo,
    target: &Path,
    password: Option<&str>,
) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| extraction_error(target, e))?;
    }

    let mut entry =
        codec::open_entry(reader, index, password).map_err(|source| open_failure(info, source))?;
    let mut file = File::create(target).map_err(|e| extraction_error(target, e))?;
    io::copy(&mut entry, &mut file).map_err(|e| extraction_error(target, e))?;
    drop(file);

    let mtime = FileTime::from_unix_time(info.modified.timestamp(), 0);
    if let Err(e) = filetime::set_file_mtime(target, mtime) {
        warn!(
            "failed to set modification time on '{}': {e}",
            target.display()
        );
    }
    Ok(())
}

fn extraction_error(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Extraction {
        path: path.to_path_buf(),
        source: source.into(),
    }
}
