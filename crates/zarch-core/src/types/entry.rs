//! Archive entry metadata.

use chrono::DateTime;
use chrono::Utc;

/// Compression method used when writing an entry.
///
/// Only methods the codec can both read and write are listed here. Entries
/// in existing archives may use others; their raw code is still reported
/// through [`EntryInfo::compression_method`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// No compression.
    Stored,
    /// Deflate (the ZIP default).
    #[default]
    Deflated,
    /// bzip2.
    Bzip2,
    /// LZMA.
    Lzma,
    /// Zstandard.
    Zstd,
}

impl CompressionMethod {
    /// Returns the ZIP method code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflated => 8,
            Self::Bzip2 => 12,
            Self::Lzma => 14,
            Self::Zstd => 93,
        }
    }

    /// Looks up a method by its ZIP method code.
    ///
    /// # Examples
    ///
    /// ```
    /// use zarch_core::CompressionMethod;
    ///
    /// assert_eq!(CompressionMethod::from_code(8), Some(CompressionMethod::Deflated));
    /// assert_eq!(CompressionMethod::from_code(99), None);
    /// ```
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Stored),
            8 => Some(Self::Deflated),
            12 => Some(Self::Bzip2),
            14 => Some(Self::Lzma),
            93 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Metadata of one archive entry.
///
/// Synthesized on demand from the central directory; it does not keep the
/// archive alive and is never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name, `/`-separated. A trailing `/` marks a directory.
    pub name: String,
    /// Uncompressed size in bytes as declared by the archive.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Last modification time. ZIP timestamps carry no zone and are
    /// interpreted as UTC.
    pub modified: DateTime<Utc>,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Raw ZIP compression method code.
    pub compression_method: u16,
    /// `true` if the name ends with `/`.
    pub is_directory: bool,
    /// `true` if the entry's encryption flag is set.
    pub is_encrypted: bool,
    /// Entry comment, if one is present.
    pub comment: Option<String>,
}

impl EntryInfo {
    /// Returns the compression method, if it is one this crate can write.
    #[must_use]
    pub const fn compression(&self) -> Option<CompressionMethod> {
        CompressionMethod::from_code(self.compression_method)
    }

    /// Returns `true` if the entry holds file content rather than marking a
    /// directory.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        !self.is_directory
    }
}
