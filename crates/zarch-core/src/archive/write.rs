//! Whole-entry write operations.

use std::fs::File;
use std::path::Path;

use chrono::DateTime;
use chrono::Utc;
use log::trace;
use log::warn;

use super::Archive;
use crate::ArchiveError;
use crate::Result;
use crate::codec;
use crate::codec::CodecError;
use crate::text;
use crate::types::AddOptions;

impl Archive {
    /// Adds `data` as a complete entry.
    ///
    /// A non-empty `options.password` encrypts this entry only, with
    /// AES-256.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for reader handles, `Closed` after close, `Busy`
    /// while an output stream is open, or `Write` on codec failure.
    pub fn add_bytes(&self, name: &str, data: &[u8], options: &AddOptions) -> Result<()> {
        let modified = options.modified.unwrap_or_else(Utc::now);
        note_dropped_comment(name, options);

        let mut state = self.shared.write();
        let writer = state.entry_writer(self.shared.sessions())?;
        let file_options = codec::entry_options(options, &modified, Some(data.len() as u64));
        codec::add_buffer(writer, name, data, file_options)
            .map_err(|source| write_error(name, source))?;

        trace!("added {name:?} ({} bytes)", data.len());
        Ok(())
    }

    /// Encodes `text` and adds it as a complete entry. `encoding` is a
    /// WHATWG label and defaults to UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if the text cannot be encoded, otherwise
    /// everything [`add_bytes`](Self::add_bytes) returns.
    pub fn add_text(
        &self,
        name: &str,
        text: &str,
        encoding: Option<&str>,
        options: &AddOptions,
    ) -> Result<()> {
        let bytes = text::encode(text, encoding)?;
        self.add_bytes(name, &bytes, options)
    }

    /// Adds the content of a filesystem file as entry `name`.
    ///
    /// Without an explicit `options.modified` the entry takes the file's
    /// modification time.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen`, `Closed` or `Busy` like
    /// [`add_bytes`](Self::add_bytes), and `Write` if the file cannot be
    /// read or the entry cannot be written.
    pub fn add_file(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        options: &AddOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        note_dropped_comment(name, options);

        let mut state = self.shared.write();
        let writer = state.entry_writer(self.shared.sessions())?;

        let mut file = File::open(path).map_err(|e| write_error(name, e.into()))?;
        let metadata = file.metadata().map_err(|e| write_error(name, e.into()))?;
        let modified = options
            .modified
            .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from))
            .unwrap_or_else(Utc::now);

        let file_options = codec::entry_options(options, &modified, Some(metadata.len()));
        let copied = codec::add_reader(writer, name, &mut file, file_options)
            .map_err(|source| write_error(name, source))?;

        trace!("added {name:?} from {} ({copied} bytes)", path.display());
        Ok(())
    }

    /// Adds an empty, uncompressed directory entry. A trailing `/` is
    /// appended to `name` if missing.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen`, `Closed` or `Busy` like
    /// [`add_bytes`](Self::add_bytes), and `Write` on codec failure.
    pub fn add_directory(&self, name: &str) -> Result<()> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };

        let mut state = self.shared.write();
        let writer = state.entry_writer(self.shared.sessions())?;
        codec::add_directory(writer, &name, &Utc::now())
            .map_err(|source| write_error(&name, source))?;

        trace!("added directory {name:?}");
        Ok(())
    }
}

fn write_error(name: &str, source: CodecError) -> ArchiveError {
    ArchiveError::Write {
        name: Some(name.to_string()),
        source,
    }
}

// The codec only writes entry comments through raw central-directory
// access, which it does not expose for new entries.
fn note_dropped_comment(name: &str, options: &AddOptions) {
    if options.comment.as_deref().is_some_and(|c| !c.is_empty()) {
        warn!("entry comments are not written; dropping comment for {name:?}");
    }
}
