//! Integration tests for zarch-core.
//!
//! These tests drive the public API end to end against real files.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io::Read;
use std::io::Write;

use tempfile::TempDir;
use zarch_core::AddOptions;
use zarch_core::Archive;
use zarch_core::ArchiveError;
use zarch_core::ArchiveMode;
use zarch_core::CompressionMethod;
use zarch_core::ExtractOptions;
use zarch_core::test_utils::ZipTestBuilder;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_file_round_trip() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("round.zip");

    let writer = Archive::create(&path).unwrap();
    assert_eq!(writer.mode(), ArchiveMode::Write);
    assert_eq!(writer.path(), Some(path.as_path()));
    writer.add_directory("docs").unwrap();
    writer
        .add_text("docs/readme.md", "# Title\n", None, &AddOptions::default())
        .unwrap();
    writer
        .add_bytes(
            "data/blob.bin",
            &[7u8; 10_000],
            &AddOptions::with_method(CompressionMethod::Bzip2),
        )
        .unwrap();
    writer.set_comment("built by tests").unwrap();
    writer.close().unwrap();
    assert!(writer.is_closed());

    let reader = Archive::open(&path).unwrap();
    assert_eq!(reader.mode(), ArchiveMode::Read);
    assert_eq!(reader.count().unwrap(), 3);
    assert_eq!(reader.comment().unwrap(), "built by tests");
    let names: Vec<String> = reader.entries().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["docs/", "docs/readme.md", "data/blob.bin"]);
    assert_eq!(reader.read_text("docs/readme.md", None).unwrap(), "# Title\n");

    let blob = reader.entry_info("data/blob.bin").unwrap();
    assert_eq!(blob.compression(), Some(CompressionMethod::Bzip2));
    assert_eq!(reader.read_bytes("data/blob.bin").unwrap(), vec![7u8; 10_000]);
}

#[test]
fn test_append_keeps_existing_entries() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("append.zip");

    let first = Archive::open_for_write(&path, false).unwrap();
    first
        .add_bytes("one.txt", b"1", &AddOptions::default())
        .unwrap();
    first.close().unwrap();

    let second = Archive::open_for_write(&path, true).unwrap();
    assert_eq!(second.mode(), ArchiveMode::Append);
    second
        .add_bytes("two.txt", b"2", &AddOptions::default())
        .unwrap();
    second.close().unwrap();

    let reader = Archive::open(&path).unwrap();
    assert_eq!(reader.read_bytes("one.txt").unwrap(), b"1");
    assert_eq!(reader.read_bytes("two.txt").unwrap(), b"2");
}

#[test]
fn test_append_to_missing_file_starts_empty_archive() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fresh.zip");

    let archive = Archive::append(&path).unwrap();
    archive
        .add_bytes("only.txt", b"only", &AddOptions::default())
        .unwrap();
    archive.close().unwrap();

    assert_eq!(Archive::open(&path).unwrap().count().unwrap(), 1);
}

#[test]
fn test_open_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let err = Archive::open(temp.path().join("absent.zip")).unwrap_err();
    assert!(matches!(err, ArchiveError::Open { .. }));
}

#[test]
fn test_entry_password_does_not_leak() {
    init_logging();
    let writer = Archive::in_memory().unwrap();
    writer
        .add_bytes(
            "secret.txt",
            b"top secret",
            &AddOptions {
                password: Some("hunter2".into()),
                ..Default::default()
            },
        )
        .unwrap();
    writer
        .add_bytes("public.txt", b"hello", &AddOptions::default())
        .unwrap();
    let bytes = writer.finalize().unwrap();

    let reader = Archive::from_bytes(bytes).unwrap();
    assert!(reader.entry_info("secret.txt").unwrap().is_encrypted);
    assert!(!reader.entry_info("public.txt").unwrap().is_encrypted);
    assert_eq!(reader.read_bytes("public.txt").unwrap(), b"hello");
    assert!(matches!(
        reader.read_bytes("secret.txt"),
        Err(ArchiveError::Decryption { .. })
    ));

    reader.set_password(Some("hunter2"));
    assert_eq!(reader.read_bytes("secret.txt").unwrap(), b"top secret");
}

#[test]
fn test_wrong_password_is_decryption_error() {
    let writer = Archive::in_memory().unwrap();
    writer
        .add_bytes(
            "vault.txt",
            b"locked",
            &AddOptions {
                password: Some("correct horse".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let bytes = writer.finalize().unwrap();

    let archive = Archive::builder()
        .password("battery staple")
        .from_bytes(bytes)
        .unwrap();
    assert!(matches!(
        archive.read_bytes("vault.txt"),
        Err(ArchiveError::Decryption { ref name, .. }) if name == "vault.txt"
    ));
    assert!(matches!(
        archive.open_input_stream("vault.txt"),
        Err(ArchiveError::Decryption { .. })
    ));
    assert_eq!(archive.active_sessions(), 0);

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("vault.txt");
    assert!(matches!(
        archive.extract_entry("vault.txt", &target),
        Err(ArchiveError::Decryption { .. })
    ));
    assert!(!target.exists());

    archive.set_password(Some("correct horse"));
    assert_eq!(archive.read_bytes("vault.txt").unwrap(), b"locked");
}

#[test]
fn test_finalize_contains_every_entry() {
    let writer = Archive::in_memory().unwrap();
    for i in 0..50 {
        writer
            .add_text(&format!("entries/{i:03}.txt"), &i.to_string(), None, &AddOptions::default())
            .unwrap();
    }
    let bytes = writer.finalize().unwrap();
    assert!(writer.is_closed());
    assert!(matches!(writer.finalize(), Err(ArchiveError::Closed)));

    let reader = Archive::from_bytes(bytes).unwrap();
    assert_eq!(reader.count().unwrap(), 50);
    assert_eq!(reader.read_text("entries/042.txt", None).unwrap(), "42");
}

#[test]
fn test_finalize_requires_memory_writer() {
    let temp = TempDir::new().unwrap();
    let archive = Archive::create(temp.path().join("file.zip")).unwrap();
    assert!(matches!(
        archive.finalize(),
        Err(ArchiveError::InvalidMode {
            mode: ArchiveMode::Write,
            ..
        })
    ));
}

#[test]
fn test_allocation_limit_guards_reads() {
    let bytes = ZipTestBuilder::new()
        .add_deflated("big.bin", &[0u8; 4096])
        .add_file("small.txt", b"ok")
        .build();
    let archive = Archive::builder()
        .max_allocation_size(1024)
        .from_bytes(bytes)
        .unwrap();

    assert!(matches!(
        archive.read_bytes("big.bin"),
        Err(ArchiveError::SizeLimit {
            size: 4096,
            max: 1024,
            ..
        })
    ));
    assert_eq!(archive.read_bytes("small.txt").unwrap(), b"ok");

    archive.set_max_allocation_size(8192);
    assert_eq!(archive.read_bytes("big.bin").unwrap().len(), 4096);
}

#[test]
fn test_allocation_limit_guards_finalize() {
    let archive = Archive::builder().max_allocation_size(64).in_memory().unwrap();
    archive
        .add_bytes(
            "payload",
            &[1u8; 256],
            &AddOptions::with_method(CompressionMethod::Stored),
        )
        .unwrap();
    assert!(matches!(
        archive.finalize(),
        Err(ArchiveError::SizeLimit { name: None, max: 64, .. })
    ));
    assert!(archive.is_closed());
}

#[test]
fn test_close_is_idempotent_and_final() {
    let archive = Archive::from_bytes(ZipTestBuilder::new().add_file("a", b"a").build()).unwrap();
    archive.close().unwrap();
    archive.close().unwrap();
    assert!(matches!(archive.count(), Err(ArchiveError::Closed)));
    assert!(matches!(archive.read_bytes("a"), Err(ArchiveError::Closed)));
}

#[test]
fn test_delete_is_not_supported() {
    let archive = Archive::in_memory().unwrap();
    archive
        .add_bytes("keep", b"k", &AddOptions::default())
        .unwrap();
    assert!(matches!(
        archive.delete_entry("keep"),
        Err(ArchiveError::NotSupported { .. })
    ));

    let archive = Archive::from_bytes(archive.finalize().unwrap()).unwrap();
    assert!(archive.has_entry("keep").unwrap());
}

#[test]
fn test_traversal_archive_writes_nothing() {
    init_logging();
    let bytes = ZipTestBuilder::new()
        .add_file("first.txt", b"1")
        .add_directory("dir/")
        .add_file("dir/../../outside.txt", b"evil")
        .build();
    let archive = Archive::from_bytes(bytes).unwrap();
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("dest");
    fs::create_dir(&dest).unwrap();

    let err = archive
        .extract_all(&dest, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::PathSecurity { ref name, .. } if name == "dir/../../outside.txt"
    ));
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    assert!(!temp.path().join("outside.txt").exists());
}

#[test]
fn test_hostile_names_rejected_before_extraction() {
    for hostile in ["../evil.txt", "/etc/passwd", "a\\..\\b", "a/../b.txt"] {
        let bytes = ZipTestBuilder::new()
            .add_file("fine.txt", b"fine")
            .add_file(hostile, b"x")
            .build();
        let archive = Archive::from_bytes(bytes).unwrap();
        let temp = TempDir::new().unwrap();

        let err = archive
            .extract_all(temp.path(), &ExtractOptions::default())
            .unwrap_err();
        assert!(err.is_security_violation(), "{hostile:?} was not rejected");
        assert_eq!(err.entry_name(), Some(hostile));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}

#[test]
fn test_empty_archive_round_trip() {
    let bytes = Archive::in_memory().unwrap().finalize().unwrap();
    let archive = Archive::from_bytes(bytes).unwrap();
    assert_eq!(archive.mode(), ArchiveMode::MemoryRead);
    assert_eq!(archive.count().unwrap(), 0);
    assert!(archive.entries().unwrap().is_empty());
    assert!(!archive.has_entry("anything").unwrap());
}

#[test]
fn test_symlink_entry_extracted_as_file() {
    let bytes = ZipTestBuilder::new()
        .add_file("target.txt", b"real")
        .add_symlink("link", "target.txt")
        .build();
    let archive = Archive::from_bytes(bytes).unwrap();
    let temp = TempDir::new().unwrap();

    archive
        .extract_all(temp.path(), &ExtractOptions::default())
        .unwrap();

    let link = temp.path().join("link");
    let metadata = fs::symlink_metadata(&link).unwrap();
    assert!(metadata.file_type().is_file());
    assert_eq!(fs::read(&link).unwrap(), b"target.txt");
}

#[test]
fn test_add_file_from_disk() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("input.log");
    fs::write(&source, "line one\nline two\n").unwrap();

    let archive = Archive::in_memory().unwrap();
    archive
        .add_file("logs/input.log", &source, &AddOptions::default())
        .unwrap();
    let archive = Archive::from_bytes(archive.finalize().unwrap()).unwrap();

    let out = temp.path().join("out");
    archive
        .extract_all(&out, &ExtractOptions::default())
        .unwrap();
    assert_eq!(
        fs::read_to_string(out.join("logs/input.log")).unwrap(),
        "line one\nline two\n"
    );
}

#[test]
fn test_streams_round_trip() {
    init_logging();
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let writer = Archive::in_memory().unwrap();
    let mut output = writer
        .open_output_stream("stream.bin", &AddOptions::default())
        .unwrap();
    for chunk in payload.chunks(10_000) {
        output.write_all(chunk).unwrap();
    }
    output.close().unwrap();
    let reader = Archive::from_bytes(writer.finalize().unwrap()).unwrap();

    let mut input = reader.open_input_stream("stream.bin").unwrap();
    assert_eq!(input.info().size, payload.len() as u64);
    assert_eq!(input.peek().unwrap(), Some(0));
    let mut read_back = Vec::new();
    input.read_to_end(&mut read_back).unwrap();
    assert_eq!(read_back, payload);
    assert_eq!(input.peek().unwrap(), None);
    input.close().unwrap();
    assert_eq!(reader.active_sessions(), 0);
}

#[test]
fn test_text_encodings() {
    let writer = Archive::in_memory().unwrap();
    writer
        .add_text("latin.txt", "café", Some("windows-1252"), &AddOptions::default())
        .unwrap();
    let reader = Archive::from_bytes(writer.finalize().unwrap()).unwrap();

    assert_eq!(reader.read_bytes("latin.txt").unwrap(), b"caf\xe9");
    assert_eq!(
        reader.read_text("latin.txt", Some("windows-1252")).unwrap(),
        "café"
    );
    assert!(matches!(
        reader.read_text("latin.txt", None),
        Err(ArchiveError::Encoding { .. })
    ));
}
