//! Test utilities for building archives directly with the codec.
//!
//! These helpers bypass the archive handle so tests can produce inputs it
//! would never write itself: traversal names, encrypted entries, odd
//! timestamps.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::AesMode;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .unix_permissions(0o644)
}

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (name, content). Files are stored uncompressed
/// in the given order.
///
/// # Examples
///
/// ```
/// use zarch_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(&[("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    entries
        .iter()
        .fold(ZipTestBuilder::new(), |builder, (name, data)| {
            builder.add_file(name, data)
        })
        .build()
}

/// Builder for ZIP test archives with various entry types.
///
/// # Examples
///
/// ```
/// use zarch_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .add_file("../escape.txt", b"evil")
///     .add_encrypted("secret.txt", b"hidden", "password")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a stored file. The name is written verbatim.
    #[must_use]
    pub fn add_file(mut self, name: &str, data: &[u8]) -> Self {
        self.zip.start_file(name, stored()).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a deflated file.
    #[must_use]
    pub fn add_deflated(mut self, name: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(name, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a stored file with a midnight timestamp on the given date.
    #[must_use]
    pub fn add_file_modified(
        mut self,
        name: &str,
        data: &[u8],
        year: u16,
        month: u8,
        day: u8,
    ) -> Self {
        let time = DateTime::from_date_and_time(year, month, day, 0, 0, 0).unwrap();
        self.zip
            .start_file(name, stored().last_modified_time(time))
            .unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds an AES-256 encrypted file.
    #[must_use]
    pub fn add_encrypted(mut self, name: &str, data: &[u8], password: &str) -> Self {
        let options = stored().with_aes_encryption(AesMode::Aes256, password);
        self.zip.start_file(name, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory entry.
    #[must_use]
    pub fn add_directory(mut self, name: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(name, options).unwrap();
        self
    }

    /// Adds a symlink entry pointing at `target`.
    #[must_use]
    pub fn add_symlink(mut self, name: &str, target: &str) -> Self {
        // ZIP stores symlinks as files with the Unix link mode bits set
        let options = SimpleFileOptions::default().unix_permissions(0o120_777);
        self.zip.start_file(name, options).unwrap();
        self.zip.write_all(target.as_bytes()).unwrap();
        self
    }

    /// Sets the archive comment.
    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.zip.set_comment(comment.to_string());
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
