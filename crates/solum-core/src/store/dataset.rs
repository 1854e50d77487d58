//! Dataset store: TTL-gated lazy reload of an immutable corpus snapshot.
//!
//! The store owns the only mutable shared state on the query path — the
//! snapshot slot. Refresh is lazy: the first call after the TTL elapses
//! reloads under the write lock, and readers swap between whole `Arc`s, so
//! a request sees either the entirely-old or entirely-new snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::errors::SolumResult;
use crate::models::CorpusRecord;
use crate::store::corpus::Snapshot;
use crate::time::{Clock, SystemClock};

/// How long a loaded snapshot is served before the next call reloads it.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

/// Where corpus bytes come from. Abstracted so reload behavior is testable
/// without touching the real data directory.
pub trait CorpusSource: Send + Sync {
    fn read(&self) -> std::io::Result<Vec<u8>>;

    /// Human-readable origin for log lines.
    fn describe(&self) -> String;
}

/// Default source: a corpus file on disk, read synchronously.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusSource for FileSource {
    fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

struct Loaded<R> {
    snapshot: Arc<Snapshot<R>>,
    loaded_at: Instant,
}

/// TTL-cached corpus store for one dataset.
pub struct DatasetStore<R> {
    source: Box<dyn CorpusSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: RwLock<Option<Loaded<R>>>,
}

impl<R: CorpusRecord> DatasetStore<R> {
    /// Store backed by a corpus file, with the default TTL and wall clock.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_parts(
            Box::new(FileSource::new(path.as_ref())),
            Arc::new(SystemClock),
            SNAPSHOT_TTL,
        )
    }

    /// Fully injected constructor; what tests use.
    pub fn with_parts(
        source: Box<dyn CorpusSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            clock,
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Current snapshot, reloading first if the TTL has elapsed.
    ///
    /// A failed reload keeps serving the previous snapshot (the failure goes
    /// to monitoring via a `warn!`, not to every request); the error is
    /// returned only when no snapshot has ever loaded. The load timestamp is
    /// not advanced on failure, so the next call retries.
    pub fn snapshot(&self) -> SolumResult<Arc<Snapshot<R>>> {
        let now = self.clock.now();

        if let Some(loaded) = self.state.read().as_ref() {
            if now.duration_since(loaded.loaded_at) < self.ttl {
                return Ok(loaded.snapshot.clone());
            }
        }

        let mut state = self.state.write();
        // Another writer may have refreshed while we waited for the lock.
        if let Some(loaded) = state.as_ref() {
            if now.duration_since(loaded.loaded_at) < self.ttl {
                return Ok(loaded.snapshot.clone());
            }
        }

        match self.load() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                debug!(
                    source = %self.source.describe(),
                    records = snapshot.len(),
                    "corpus snapshot loaded"
                );
                *state = Some(Loaded {
                    snapshot: snapshot.clone(),
                    loaded_at: self.clock.now(),
                });
                Ok(snapshot)
            }
            Err(err) => match state.as_ref() {
                Some(loaded) => {
                    warn!(
                        source = %self.source.describe(),
                        error = %err,
                        "corpus reload failed, serving previous snapshot"
                    );
                    Ok(loaded.snapshot.clone())
                }
                None => Err(err),
            },
        }
    }

    /// Reload unconditionally, surfacing the load error to the caller.
    ///
    /// Meant for monitoring/ops paths that need the failure itself; request
    /// paths should call [`snapshot`](Self::snapshot).
    pub fn force_reload(&self) -> SolumResult<Arc<Snapshot<R>>> {
        let snapshot = Arc::new(self.load()?);
        let mut state = self.state.write();
        *state = Some(Loaded {
            snapshot: snapshot.clone(),
            loaded_at: self.clock.now(),
        });
        Ok(snapshot)
    }

    /// Whether a snapshot is currently installed (fresh or stale).
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    fn load(&self) -> SolumResult<Snapshot<R>> {
        let bytes = self.source.read()?;
        Snapshot::from_slice(&bytes)
    }
}
