//! State shared between an archive handle and its streaming sessions.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::ArchiveError;
use crate::Result;
use crate::codec::CodecReader;
use crate::codec::CodecWriter;

/// Codec handle owned by an archive. At most one of reader or writer is
/// ever live.
pub(crate) enum Backend {
    Reader(CodecReader),
    // The mutex only makes the writer `Sync`; it is always reached through
    // `get_mut` while the state write lock is held.
    Writer(Mutex<CodecWriter>),
    Closed,
}

/// Everything guarded by the handle lock.
pub(crate) struct State {
    pub backend: Backend,
    pub password: Option<String>,
    /// Id of the output stream that currently has an entry open.
    pub writing_stream: Option<u64>,
}

impl State {
    pub const fn is_closed(&self) -> bool {
        matches!(self.backend, Backend::Closed)
    }

    /// Returns the reader, failing for writer or closed handles.
    pub fn reader(&self) -> Result<&CodecReader> {
        match &self.backend {
            Backend::Reader(reader) => Ok(reader),
            Backend::Writer(_) => Err(ArchiveError::NotOpen { access: "reading" }),
            Backend::Closed => Err(ArchiveError::Closed),
        }
    }

    /// Returns the writer, failing for reader or closed handles.
    pub fn writer(&mut self) -> Result<&mut CodecWriter> {
        match &mut self.backend {
            Backend::Writer(writer) => Ok(writer.get_mut().unwrap_or_else(PoisonError::into_inner)),
            Backend::Reader(_) => Err(ArchiveError::NotOpen { access: "writing" }),
            Backend::Closed => Err(ArchiveError::Closed),
        }
    }

    /// Returns the writer for starting a new entry. Fails with `Busy`
    /// while an output stream has an entry open.
    pub fn entry_writer(&mut self, active: usize) -> Result<&mut CodecWriter> {
        if self.writing_stream.is_some() && matches!(self.backend, Backend::Writer(_)) {
            return Err(ArchiveError::Busy { active });
        }
        self.writer()
    }

    /// Returns the writer if output stream `id` owns the open entry.
    pub fn stream_writer(&mut self, id: u64) -> Option<&mut CodecWriter> {
        if self.writing_stream != Some(id) {
            return None;
        }
        self.writer().ok()
    }
}

/// Archive state plus the counters that live outside the lock.
pub(crate) struct Shared {
    state: RwLock<State>,
    sessions: AtomicUsize,
    max_allocation_size: AtomicU64,
    next_stream_id: AtomicU64,
}

impl Shared {
    pub fn new(backend: Backend, password: Option<String>, max_allocation_size: u64) -> Self {
        Self {
            state: RwLock::new(State {
                backend,
                password,
                writing_stream: None,
            }),
            sessions: AtomicUsize::new(0),
            max_allocation_size: AtomicU64::new(max_allocation_size),
            next_stream_id: AtomicU64::new(1),
        }
    }

    // Every state mutation is a single assignment, so a panic while the
    // lock was held cannot leave it half-updated.
    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::Acquire)
    }

    pub fn max_allocation_size(&self) -> u64 {
        self.max_allocation_size.load(Ordering::Relaxed)
    }

    pub fn set_max_allocation_size(&self, max: u64) {
        self.max_allocation_size.store(max, Ordering::Relaxed);
    }

    pub fn next_stream_id(&self) -> u64 {
        self.next_stream_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Counts one streaming session against the handle for as long as it
/// lives.
pub(crate) struct SessionGuard {
    shared: Arc<Shared>,
}

impl SessionGuard {
    /// Registers a session. Callers hold the state lock so that a
    /// concurrent close cannot miss it.
    pub fn acquire(shared: &Arc<Shared>) -> Self {
        shared.sessions.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(shared),
        }
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.shared.sessions.fetch_sub(1, Ordering::AcqRel);
    }
}
