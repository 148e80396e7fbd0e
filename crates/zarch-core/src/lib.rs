//! Thread-safe ZIP archive handles with streaming sessions.
//!
//! `zarch-core` wraps the `zip` codec in an [`Archive`] handle that can be
//! shared between threads. A handle reads or writes a file-backed or
//! in-memory archive, enforces an allocation limit on whole-entry reads,
//! validates entry names before extraction, and hands out streaming
//! sessions that stay usable without holding the handle's lock.
//!
//! # Examples
//!
//! ```no_run
//! use zarch_core::AddOptions;
//! use zarch_core::Archive;
//! use zarch_core::ExtractOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Archive::create("bundle.zip")?;
//! archive.add_text("notes.txt", "hello", None, &AddOptions::default())?;
//! archive.add_file("logo.png", "assets/logo.png", &AddOptions::default())?;
//! archive.close()?;
//!
//! let archive = Archive::open("bundle.zip")?;
//! for entry in archive.entries()? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! archive.extract_all("/tmp/bundle", &ExtractOptions::default())?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
mod codec;
pub mod config;
pub mod error;
pub mod security;
pub mod stream;
pub mod text;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use archive::Archive;
pub use archive::ArchiveBuilder;
pub use codec::CodecError;
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use error::Result;
pub use stream::InputStream;
pub use stream::OutputStream;

// Re-export types module for easier access
pub use types::AddOptions;
pub use types::ArchiveMode;
pub use types::CompressionMethod;
pub use types::EntryInfo;
pub use types::ExtractOptions;
