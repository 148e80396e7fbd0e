//! Incremental entry writer.

use std::fmt;
use std::io::Write;
use std::io::{self};
use std::sync::Arc;

use chrono::Utc;
use log::trace;

use crate::ArchiveError;
use crate::Result;
use crate::archive::shared::SessionGuard;
use crate::archive::shared::Shared;
use crate::codec;
use crate::types::AddOptions;

/// Writes one entry incrementally.
///
/// The entry is started when the stream is opened and completed when the
/// next entry starts or the archive is closed. While the stream is open no
/// other entry can be written to the same archive.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use zarch_core::AddOptions;
/// use zarch_core::Archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = Archive::in_memory()?;
/// let mut stream = archive.open_output_stream("data.csv", &AddOptions::default())?;
/// writeln!(stream, "id,name")?;
/// writeln!(stream, "1,widget")?;
/// stream.close()?;
///
/// let archive = Archive::from_bytes(archive.finalize()?)?;
/// assert_eq!(archive.read_text("data.csv", None)?, "id,name\n1,widget\n");
/// # Ok(())
/// # }
/// ```
pub struct OutputStream {
    name: String,
    id: u64,
    session: Option<SessionGuard>,
}

impl OutputStream {
    pub(crate) fn open(shared: &Arc<Shared>, name: &str, options: &AddOptions) -> Result<Self> {
        let modified = options.modified.unwrap_or_else(Utc::now);

        let mut state = shared.write();
        let writer = state.entry_writer(shared.sessions())?;
        let file_options = codec::entry_options(options, &modified, None);
        codec::start_entry(writer, name, file_options).map_err(|source| ArchiveError::Stream {
            name: name.to_string(),
            reason: "failed to open entry for writing",
            source: Some(source),
        })?;

        let id = shared.next_stream_id();
        state.writing_stream = Some(id);
        let session = SessionGuard::acquire(shared);
        drop(state);

        trace!("opened output stream on {name:?}");
        Ok(Self {
            name: name.to_string(),
            id,
            session: Some(session),
        })
    }

    /// Returns the entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the stream has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Appends `data` to the entry. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the stream is closed, or `StreamWrite` if the
    /// codec does not accept all of `data`.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        let Some(session) = &self.session else {
            return Err(self.closed_error());
        };
        if data.is_empty() {
            return Ok(());
        }

        let mut state = session.shared().write();
        let Some(writer) = state.stream_writer(self.id) else {
            return Err(self.closed_error());
        };
        writer
            .write_all(data)
            .map_err(|e| ArchiveError::StreamWrite {
                name: self.name.clone(),
                source: e.into(),
            })
    }

    /// Ends the session. Closing twice is a no-op.
    ///
    /// This flushes buffered data but does not complete the entry: the codec
    /// writes the entry's CRC and sizes only when the next entry starts or
    /// the archive is closed. A failure at that point is reported by that
    /// later call, under its own entry name (or none, for `close` and
    /// `finalize`), not by this stream.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if buffered data cannot be flushed. The session is
    /// released either way.
    pub fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        let mut state = session.shared().write();
        let flushed = state
            .stream_writer(self.id)
            .map_or(Ok(()), |writer| writer.flush());
        if state.writing_stream == Some(self.id) {
            state.writing_stream = None;
        }
        drop(state);
        drop(session);
        trace!("closed output stream on {:?}", self.name);

        flushed.map_err(|e| ArchiveError::Stream {
            name: self.name.clone(),
            reason: "failed to close entry",
            source: Some(e.into()),
        })
    }

    fn closed_error(&self) -> ArchiveError {
        ArchiveError::Stream {
            name: self.name.clone(),
            reason: "stream is closed",
            source: None,
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::AddOptions;
    use crate::Archive;
    use crate::ArchiveError;

    #[test]
    fn test_chunks_form_one_entry() {
        let archive = Archive::in_memory().unwrap();
        let mut stream = archive
            .open_output_stream("parts.txt", &AddOptions::default())
            .unwrap();
        stream.write_chunk(b"one ").unwrap();
        stream.write_chunk(b"").unwrap();
        stream.write_chunk(b"two").unwrap();
        stream.close().unwrap();

        let archive = Archive::from_bytes(archive.finalize().unwrap()).unwrap();
        assert_eq!(archive.read_bytes("parts.txt").unwrap(), b"one two");
    }

    #[test]
    fn test_other_writes_busy_while_open() {
        let archive = Archive::in_memory().unwrap();
        let mut stream = archive
            .open_output_stream("a", &AddOptions::default())
            .unwrap();

        assert!(matches!(
            archive.add_bytes("b", b"b", &AddOptions::default()),
            Err(ArchiveError::Busy { active: 1 })
        ));
        assert!(matches!(
            archive.open_output_stream("c", &AddOptions::default()),
            Err(ArchiveError::Busy { .. })
        ));
        assert!(matches!(archive.finalize(), Err(ArchiveError::Busy { .. })));

        stream.close().unwrap();
        archive
            .add_bytes("b", b"b", &AddOptions::default())
            .unwrap();
        let archive = Archive::from_bytes(archive.finalize().unwrap()).unwrap();
        assert_eq!(archive.count().unwrap(), 2);
    }

    #[test]
    fn test_write_after_close_fails() {
        let archive = Archive::in_memory().unwrap();
        let mut stream = archive
            .open_output_stream("a", &AddOptions::default())
            .unwrap();
        stream.close().unwrap();
        stream.close().unwrap();
        assert!(stream.is_closed());
        assert!(matches!(
            stream.write_chunk(b"late"),
            Err(ArchiveError::Stream { .. })
        ));
        assert_eq!(archive.active_sessions(), 0);
    }

    #[test]
    fn test_output_stream_on_reader_fails() {
        let empty = Archive::in_memory().unwrap().finalize().unwrap();
        let archive = Archive::from_bytes(empty).unwrap();
        assert!(matches!(
            archive.open_output_stream("x", &AddOptions::default()),
            Err(ArchiveError::NotOpen { access: "writing" })
        ));
        assert_eq!(archive.active_sessions(), 0);
    }

    #[test]
    fn test_encrypted_stream() {
        let archive = Archive::in_memory().unwrap();
        let options = AddOptions {
            password: Some("pw".into()),
            ..Default::default()
        };
        let mut stream = archive.open_output_stream("s", &options).unwrap();
        stream.write_chunk(b"secret").unwrap();
        drop(stream);

        let archive = Archive::builder()
            .password("pw")
            .from_bytes(archive.finalize().unwrap())
            .unwrap();
        assert!(archive.entry_info("s").unwrap().is_encrypted);
        assert_eq!(archive.read_bytes("s").unwrap(), b"secret");
    }
}
