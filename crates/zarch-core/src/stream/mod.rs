//! Streaming sessions over single entries.
//!
//! An [`InputStream`] reads one entry incrementally; an [`OutputStream`]
//! writes one entry incrementally. Each session is owned by one consumer,
//! is not guarded by the archive lock while in use, and counts against the
//! archive's active sessions until it is closed or dropped.

mod input;
mod output;

pub use input::InputStream;
pub use output::OutputStream;

/// Size of the chunks moved between the codec and a stream.
pub(crate) const CHUNK_SIZE: usize = 64 * 1024; // 64 KB
