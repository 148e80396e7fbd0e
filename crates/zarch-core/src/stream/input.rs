//! Incremental entry reader.

use std::fmt;
use std::io::Read;
use std::io::{self};
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::SyncSender;
use std::thread;
use std::thread::JoinHandle;

use log::trace;

use super::CHUNK_SIZE;
use crate::ArchiveError;
use crate::Result;
use crate::archive::read::locate;
use crate::archive::read::open_failure;
use crate::archive::shared::SessionGuard;
use crate::archive::shared::Shared;
use crate::codec;
use crate::codec::CodecError;
use crate::codec::CodecReader;
use crate::types::EntryInfo;

/// Decompressed chunks kept in flight ahead of the consumer.
const CHANNEL_DEPTH: usize = 4;

enum Chunk {
    Data(Vec<u8>),
    End,
    Failed(CodecError),
}

/// Reads one entry incrementally.
///
/// The codec's entry reader borrows its archive, so decompression runs on
/// a worker thread that owns a private cursor over the archive and hands
/// chunks over a bounded channel.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use zarch_core::Archive;
/// use zarch_core::test_utils::create_test_zip;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = Archive::from_bytes(create_test_zip(&[("log.txt", b"line 1\nline 2\n")]))?;
/// let mut stream = archive.open_input_stream("log.txt")?;
/// assert_eq!(stream.peek()?, Some(b'l'));
///
/// let mut text = String::new();
/// stream.read_to_string(&mut text)?;
/// assert_eq!(text, "line 1\nline 2\n");
/// stream.close()?;
/// # Ok(())
/// # }
/// ```
pub struct InputStream {
    name: String,
    info: EntryInfo,
    chunks: Option<Receiver<Chunk>>,
    worker: Option<JoinHandle<()>>,
    buffer: Vec<u8>,
    pos: usize,
    finished: bool,
    session: Option<SessionGuard>,
}

impl InputStream {
    pub(crate) fn open(shared: &Arc<Shared>, name: &str) -> Result<Self> {
        let state = shared.read();
        let mut reader = state.reader()?.clone();
        let index = locate(&reader, name)?;
        let info = codec::entry_info_at(&mut reader, index).map_err(|source| {
            ArchiveError::Stream {
                name: name.to_string(),
                reason: "failed to read entry metadata",
                source: Some(source),
            }
        })?;
        let password = state.password.clone();
        let session = SessionGuard::acquire(shared);
        drop(state);

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (chunk_tx, chunk_rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        let worker = thread::Builder::new()
            .name("zarch-input".to_string())
            .spawn(move || pump(reader, index, password, &ready_tx, &chunk_tx))
            .map_err(|e| ArchiveError::Stream {
                name: name.to_string(),
                reason: "failed to start entry reader",
                source: Some(e.into()),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                let _ = worker.join();
                return Err(match open_failure(&info, source) {
                    err @ ArchiveError::Decryption { .. } => err,
                    ArchiveError::Read { source, .. } => ArchiveError::Stream {
                        name: name.to_string(),
                        reason: "failed to open entry",
                        source: Some(source),
                    },
                    other => other,
                });
            }
            Err(_) => {
                let _ = worker.join();
                return Err(ArchiveError::Stream {
                    name: name.to_string(),
                    reason: "entry reader exited",
                    source: None,
                });
            }
        }

        trace!("opened input stream on {name:?}");
        Ok(Self {
            name: name.to_string(),
            info,
            chunks: Some(chunk_rx),
            worker: Some(worker),
            buffer: Vec::new(),
            pos: 0,
            finished: false,
            session: Some(session),
        })
    }

    /// Returns the entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry metadata captured when the stream was opened.
    #[must_use]
    pub const fn info(&self) -> &EntryInfo {
        &self.info
    }

    /// Returns `true` once the stream has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Reads up to `buf.len()` bytes, returning 0 at the end of the entry.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the stream is closed, or `StreamRead` if
    /// decompression fails.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.fill()? || buf.is_empty() {
            return Ok(0);
        }
        let available = &self.buffer[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }

    /// Returns the next byte without consuming it, or `None` at the end of
    /// the entry. Repeated peeks return the same byte.
    ///
    /// # Errors
    ///
    /// Same as [`read_chunk`](Self::read_chunk).
    pub fn peek(&mut self) -> Result<Option<u8>> {
        if self.fill()? {
            Ok(Some(self.buffer[self.pos]))
        } else {
            Ok(None)
        }
    }

    /// Stops decompression and releases the session. Closing twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the entry reader panicked.
    pub fn close(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        // Dropping the receiver makes the worker's next send fail.
        self.chunks = None;
        self.buffer = Vec::new();
        self.pos = 0;
        self.finished = true;

        let joined = self.worker.take().map_or(Ok(()), JoinHandle::join);
        self.session = None;
        trace!("closed input stream on {:?}", self.name);

        joined.map_err(|_| ArchiveError::Stream {
            name: self.name.clone(),
            reason: "entry reader panicked",
            source: None,
        })
    }

    /// Makes sure unread bytes are buffered. Returns `false` at the end of
    /// the entry.
    fn fill(&mut self) -> Result<bool> {
        while self.pos >= self.buffer.len() {
            if self.session.is_none() {
                return Err(ArchiveError::Stream {
                    name: self.name.clone(),
                    reason: "stream is closed",
                    source: None,
                });
            }
            if self.finished {
                return Ok(false);
            }
            let Some(chunks) = &self.chunks else {
                return Ok(false);
            };

            match chunks.recv() {
                Ok(Chunk::Data(data)) => {
                    self.buffer = data;
                    self.pos = 0;
                }
                Ok(Chunk::End) => self.finished = true,
                Ok(Chunk::Failed(source)) => {
                    self.finished = true;
                    return Err(ArchiveError::StreamRead {
                        name: self.name.clone(),
                        source,
                    });
                }
                Err(_) => {
                    self.finished = true;
                    return Err(ArchiveError::StreamRead {
                        name: self.name.clone(),
                        source: CodecError::Io(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "entry reader exited",
                        )),
                    });
                }
            }
        }
        Ok(true)
    }
}

fn pump(
    mut reader: CodecReader,
    index: usize,
    password: Option<String>,
    ready: &SyncSender<std::result::Result<(), CodecError>>,
    chunks: &SyncSender<Chunk>,
) {
    let mut entry = match codec::open_entry(&mut reader, index, password.as_deref()) {
        Ok(entry) => entry,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let chunk = match entry.read(&mut buffer) {
            Ok(0) => Chunk::End,
            Ok(n) => Chunk::Data(buffer[..n].to_vec()),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => Chunk::Failed(err.into()),
        };
        let last = !matches!(chunk, Chunk::Data(_));
        if chunks.send(chunk).is_err() || last {
            return;
        }
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(io::Error::other)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Drop for InputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::Archive;
    use crate::ArchiveError;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::create_test_zip;
    use std::io::Read;

    #[test]
    fn test_peek_is_idempotent() {
        let archive = Archive::from_bytes(create_test_zip(&[("ab", b"ab")])).unwrap();
        let mut stream = archive.open_input_stream("ab").unwrap();

        assert_eq!(stream.peek().unwrap(), Some(b'a'));
        assert_eq!(stream.peek().unwrap(), Some(b'a'));

        let mut buf = [0u8; 1];
        assert_eq!(stream.read_chunk(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'a');
        assert_eq!(stream.peek().unwrap(), Some(b'b'));
        assert_eq!(stream.read_chunk(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'b');

        assert_eq!(stream.peek().unwrap(), None);
        assert_eq!(stream.peek().unwrap(), None);
        assert_eq!(stream.read_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_large_entry_reads_in_chunks() {
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let bytes = ZipTestBuilder::new().add_deflated("big.bin", &data).build();
        let archive = Archive::from_bytes(bytes).unwrap();

        let mut stream = archive.open_input_stream("big.bin").unwrap();
        assert_eq!(stream.info().size, 300_000);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_session_counted_until_close() {
        let archive = Archive::from_bytes(create_test_zip(&[("a", b"a")])).unwrap();
        let mut stream = archive.open_input_stream("a").unwrap();
        assert_eq!(archive.active_sessions(), 1);
        assert!(matches!(archive.close(), Err(ArchiveError::Busy { active: 1 })));

        stream.close().unwrap();
        stream.close().unwrap();
        assert_eq!(archive.active_sessions(), 0);
        assert!(matches!(
            stream.read_chunk(&mut [0u8; 4]),
            Err(ArchiveError::Stream { .. })
        ));
        archive.close().unwrap();
    }

    #[test]
    fn test_drop_releases_session() {
        let archive = Archive::from_bytes(create_test_zip(&[("a", b"abc")])).unwrap();
        {
            let mut stream = archive.open_input_stream("a").unwrap();
            assert_eq!(stream.peek().unwrap(), Some(b'a'));
        }
        assert_eq!(archive.active_sessions(), 0);
    }

    #[test]
    fn test_failed_open_rolls_back_session() {
        let bytes = ZipTestBuilder::new()
            .add_encrypted("secret", b"hidden", "pw")
            .build();
        let archive = Archive::from_bytes(bytes).unwrap();

        let err = archive.open_input_stream("secret").unwrap_err();
        assert!(matches!(err, ArchiveError::Decryption { .. }));
        assert!(matches!(
            archive.open_input_stream("missing").unwrap_err(),
            ArchiveError::EntryNotFound { .. }
        ));
        assert_eq!(archive.active_sessions(), 0);

        archive.set_password(Some("pw"));
        let mut stream = archive.open_input_stream("secret").unwrap();
        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hidden");
    }

    #[test]
    fn test_abandoned_large_stream_closes() {
        let data = vec![1u8; 2 * 1024 * 1024];
        let bytes = ZipTestBuilder::new().add_file("big", &data).build();
        let archive = Archive::from_bytes(bytes).unwrap();

        let mut stream = archive.open_input_stream("big").unwrap();
        let mut buf = [0u8; 16];
        stream.read_chunk(&mut buf).unwrap();
        stream.close().unwrap();
        assert_eq!(archive.active_sessions(), 0);
    }
}
