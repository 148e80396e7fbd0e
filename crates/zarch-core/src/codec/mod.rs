//! Adapter over the `zip` codec.
//!
//! Apart from the test helpers, this is the only module that names `zip`
//! types. Everything above it works with [`CodecReader`], [`CodecWriter`], [`CodecError`] and the
//! crate's own metadata types.

mod error;
mod source;

pub use error::CodecError;
pub use source::ArchiveSink;
pub use source::ArchiveSource;
pub use source::SharedFile;

use std::io::Read;
use std::io::Seek;
use std::io::Write;

use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::Timelike;
use chrono::Utc;
use zip::AesMode;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::read::ZipFile;
use zip::write::FileOptions;

use crate::types::AddOptions;
use crate::types::CompressionMethod;
use crate::types::EntryInfo;

/// Codec reader over a clonable source.
pub type CodecReader = ZipArchive<ArchiveSource>;

/// Codec writer over a file or buffer sink.
pub type CodecWriter = ZipWriter<ArchiveSink>;

/// Result type for codec calls.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Entries at least this large need ZIP64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Parses the central directory of `source`.
pub fn open_reader(source: ArchiveSource) -> CodecResult<CodecReader> {
    Ok(ZipArchive::new(source)?)
}

/// Starts a writer on `sink`, appending to the archive already in it when
/// `append` is set.
pub fn open_writer(sink: ArchiveSink, append: bool) -> CodecResult<CodecWriter> {
    if append {
        Ok(ZipWriter::new_append(sink)?)
    } else {
        Ok(ZipWriter::new(sink))
    }
}

/// Builds per-entry codec options.
///
/// Encryption is attached to the returned options only, so it never
/// outlives the entry being written. Without a `size_hint` the entry is
/// written with ZIP64 headers, since the codec aborts an entry that grows
/// past 4 GiB without them.
pub fn entry_options<'k>(
    options: &'k AddOptions,
    modified: &DateTime<Utc>,
    size_hint: Option<u64>,
) -> FileOptions<'k, ()> {
    let large = size_hint.is_none_or(|size| size >= LARGE_FILE_THRESHOLD);
    let file_options = FileOptions::<'k, ()>::default()
        .compression_method(zip_method(options.compression_method))
        .compression_level(options.effective_level())
        .last_modified_time(to_zip_time(modified))
        .large_file(large);

    match options.encryption_password() {
        Some(password) => file_options.with_aes_encryption(AesMode::Aes256, password),
        None => file_options,
    }
}

/// Writes `data` as a complete entry.
pub fn add_buffer(
    writer: &mut CodecWriter,
    name: &str,
    data: &[u8],
    options: FileOptions<'_, ()>,
) -> CodecResult<()> {
    writer.start_file(name, options)?;
    writer.write_all(data)?;
    Ok(())
}

/// Streams `reader` into a new entry, returning the number of bytes
/// copied.
pub fn add_reader<R: Read>(
    writer: &mut CodecWriter,
    name: &str,
    reader: &mut R,
    options: FileOptions<'_, ()>,
) -> CodecResult<u64> {
    writer.start_file(name, options)?;

    let mut buffer = vec![0u8; 64 * 1024]; // 64 KB
    let mut copied = 0u64;
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
        copied += bytes_read as u64;
    }
    Ok(copied)
}

/// Writes an empty, uncompressed directory marker.
pub fn add_directory(
    writer: &mut CodecWriter,
    name: &str,
    modified: &DateTime<Utc>,
) -> CodecResult<()> {
    let options = FileOptions::<'_, ()>::default()
        .compression_method(zip::CompressionMethod::Stored)
        .last_modified_time(to_zip_time(modified));
    writer.add_directory(name, options)?;
    Ok(())
}

/// Starts an entry that the caller will fill through the writer.
pub fn start_entry(
    writer: &mut CodecWriter,
    name: &str,
    options: FileOptions<'_, ()>,
) -> CodecResult<()> {
    writer.start_file(name, options)?;
    Ok(())
}

/// Opens entry `index` for decompression, decrypting it with `password`
/// when one is given. Unencrypted entries ignore the password.
pub fn open_entry<'a>(
    reader: &'a mut CodecReader,
    index: usize,
    password: Option<&str>,
) -> CodecResult<ZipFile<'a, ArchiveSource>> {
    let file = match password {
        Some(password) => reader.by_index_decrypt(index, password.as_bytes())?,
        None => reader.by_index(index)?,
    };
    Ok(file)
}

/// Reads the metadata of entry `index` without decompressing it.
pub fn entry_info_at(reader: &mut CodecReader, index: usize) -> CodecResult<EntryInfo> {
    let file = reader.by_index_raw(index)?;
    Ok(entry_info(&file))
}

/// Synthesizes entry metadata from a codec entry.
pub fn entry_info<R: Read + Seek>(file: &ZipFile<'_, R>) -> EntryInfo {
    let name = file.name().to_string();
    let comment = file.comment();
    EntryInfo {
        is_directory: name.ends_with('/'),
        name,
        size: file.size(),
        compressed_size: file.compressed_size(),
        modified: file.last_modified().map(from_zip_time).unwrap_or_default(),
        crc32: file.crc32(),
        compression_method: method_code(file.compression()),
        is_encrypted: file.encrypted(),
        comment: (!comment.is_empty()).then(|| comment.to_string()),
    }
}

/// Returns the archive comment, replacing invalid UTF-8.
pub fn archive_comment(reader: &CodecReader) -> String {
    String::from_utf8_lossy(reader.comment()).into_owned()
}

const fn zip_method(method: CompressionMethod) -> zip::CompressionMethod {
    match method {
        CompressionMethod::Stored => zip::CompressionMethod::Stored,
        CompressionMethod::Deflated => zip::CompressionMethod::Deflated,
        CompressionMethod::Bzip2 => zip::CompressionMethod::Bzip2,
        CompressionMethod::Lzma => zip::CompressionMethod::Lzma,
        CompressionMethod::Zstd => zip::CompressionMethod::Zstd,
    }
}

#[allow(deprecated)]
const fn method_code(method: zip::CompressionMethod) -> u16 {
    method.to_u16()
}

/// Converts to a ZIP timestamp. Times outside 1980..=2107 clamp to the
/// ZIP epoch.
fn to_zip_time(time: &DateTime<Utc>) -> zip::DateTime {
    let field = |value: u32| u8::try_from(value).unwrap_or(u8::MAX);
    let Ok(year) = u16::try_from(time.year()) else {
        return zip::DateTime::default();
    };
    zip::DateTime::from_date_and_time(
        year,
        field(time.month()),
        field(time.day()),
        field(time.hour()),
        field(time.minute()),
        field(time.second()),
    )
    .unwrap_or_default()
}

fn from_zip_time(time: zip::DateTime) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(
        i32::from(time.year()),
        u32::from(time.month()),
        u32::from(time.day()),
    )
    .and_then(|date| {
        date.and_hms_opt(
            u32::from(time.hour()),
            u32::from(time.minute()),
            u32::from(time.second()),
        )
    })
    .map(|naive| naive.and_utc())
    .unwrap_or_default()
}
