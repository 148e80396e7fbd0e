//! Value types shared by the archive handle and its streaming sessions.
//!
//! Everything here is plain data: entry metadata synthesized from the
//! central directory, per-call add/extract options, and the handle mode.
//! None of these types own codec resources.

pub mod entry;
pub mod mode;
pub mod options;

pub use entry::CompressionMethod;
pub use entry::EntryInfo;
pub use mode::ArchiveMode;
pub use options::AddOptions;
pub use options::ExtractOptions;
