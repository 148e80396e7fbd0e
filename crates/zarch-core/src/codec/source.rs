//! Byte sources and sinks handed to the codec.

use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// A file shared between readers, each with its own position.
#[derive(Debug, Clone)]
pub struct SharedFile {
    file: Arc<Mutex<File>>,
    len: u64,
    pos: u64,
}

impl SharedFile {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its metadata read.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            len,
            pos: 0,
        })
    }
}

impl Read for SharedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start(self.pos))?;
        let n = file.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for SharedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            ));
        };
        self.pos = target;
        Ok(target)
    }
}

/// Read side of an archive: a shared file or an immutable shared buffer.
///
/// Cloning is cheap and yields an independent cursor over the same bytes,
/// which lets several readers walk the archive at once.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    /// File-backed source.
    File(SharedFile),
    /// Buffer-backed source.
    Memory(Cursor<Arc<[u8]>>),
}

impl ArchiveSource {
    /// Wraps an in-memory archive.
    pub fn memory(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory(Cursor::new(bytes.into()))
    }
}

impl Read for ArchiveSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for ArchiveSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(file) => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// Write side of an archive: a file or a growable buffer.
#[derive(Debug)]
pub enum ArchiveSink {
    /// File-backed sink.
    File(File),
    /// Buffer-backed sink.
    Memory(Cursor<Vec<u8>>),
}

impl ArchiveSink {
    /// Returns the buffer of a memory sink, `None` for file sinks.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::File(_) => None,
            Self::Memory(cursor) => Some(cursor.into_inner()),
        }
    }
}

impl Read for ArchiveSink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Write for ArchiveSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.write(buf),
            Self::Memory(cursor) => cursor.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(file) => file.flush(),
            Self::Memory(cursor) => cursor.flush(),
        }
    }
}

impl Seek for ArchiveSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File(file) => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clones_have_independent_cursors() {
        let mut a = ArchiveSource::memory(b"abcdef".to_vec());
        let mut b = a.clone();

        let mut buf = [0u8; 3];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");

        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"def");
    }

    #[test]
    fn test_shared_file_clones_have_independent_cursors() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();
        tmp.flush().unwrap();

        let mut a = ArchiveSource::File(SharedFile::open(tmp.path()).unwrap());
        let mut b = a.clone();

        a.seek(SeekFrom::End(-2)).unwrap();
        let mut buf = [0u8; 2];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"89");

        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"01");
        b.seek(SeekFrom::Current(3)).unwrap();
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"56");
    }

    #[test]
    fn test_shared_file_rejects_negative_seek() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut file = SharedFile::open(tmp.path()).unwrap();
        let err = file.seek(SeekFrom::Current(-1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_memory_sink_into_bytes() {
        let mut sink = ArchiveSink::Memory(Cursor::new(Vec::new()));
        sink.write_all(b"zip").unwrap();
        assert_eq!(sink.into_bytes().unwrap(), b"zip");
    }
}
