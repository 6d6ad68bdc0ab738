//! Metrics Cache Module
//! Process-wide cache of derived metrics tables, keyed by dataset path.
//!
//! An entry stays valid while the file's modification time and size are
//! unchanged. Concurrent callers for the same path wait on a per-path slot,
//! so a dataset is read and derived at most once per change.

use crate::data::loader::{DataLoader, LoaderError, TableSource};
use crate::data::metrics::{MetricsDeriver, MetricsError};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] LoaderError),
    #[error(transparent)]
    Format(#[from] MetricsError),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Source(LoaderError::NotFound(_)))
    }

    pub fn is_data_format(&self) -> bool {
        matches!(self, LoadError::Format(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, LoaderError> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoaderError::NotFound(path.to_path_buf()),
            _ => LoaderError::Io(e),
        })?;

        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct Entry {
    fingerprint: Fingerprint,
    table: Arc<DataFrame>,
}

type Slot = Arc<Mutex<Option<Entry>>>;

/// Cache of derived tables with change detection and single-flight loading.
pub struct MetricsCache<S = DataLoader> {
    source: S,
    slots: Mutex<HashMap<PathBuf, Slot>>,
    loads: AtomicUsize,
}

impl Default for MetricsCache<DataLoader> {
    fn default() -> Self {
        Self::new(DataLoader::new())
    }
}

impl<S: TableSource> MetricsCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the derived table for `path`, reading the source only when
    /// there is no entry yet or the file changed since the last read.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<Arc<DataFrame>, LoadError> {
        let path = path.as_ref();
        let fingerprint = Fingerprint::of(path)?;
        let key = fs::canonicalize(path).map_err(LoaderError::Io)?;

        let slot = self.slot(&key);
        let mut entry = lock(&slot);

        if let Some(cached) = entry.as_ref() {
            if cached.fingerprint == fingerprint {
                tracing::debug!(path = %key.display(), "metrics cache hit");
                return Ok(Arc::clone(&cached.table));
            }
            tracing::info!(path = %key.display(), "dataset changed on disk, reloading");
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        let raw = self.source.read(&key)?;
        let table = Arc::new(MetricsDeriver::derive(&raw)?);

        tracing::info!(
            path = %key.display(),
            rows = table.height(),
            columns = table.width(),
            "derived metrics table"
        );

        *entry = Some(Entry {
            fingerprint,
            table: Arc::clone(&table),
        });

        Ok(table)
    }

    /// Drop the entry for one path. The next `get` reads the source again.
    pub fn invalidate(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if lock(&self.slots).remove(&key).is_some() {
            tracing::debug!(path = %key.display(), "metrics cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    /// Number of source reads performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn slot(&self, key: &Path) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.to_path_buf()).or_default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

static GLOBAL: OnceLock<MetricsCache> = OnceLock::new();

/// The process-wide cache backing [`load_data`].
pub fn global() -> &'static MetricsCache {
    GLOBAL.get_or_init(MetricsCache::default)
}

/// Load a sales dataset and derive its profitability metrics.
///
/// Repeated calls with an unchanged file return the same table without
/// touching the source again.
pub fn load_data(path: impl AsRef<Path>) -> Result<Arc<DataFrame>, LoadError> {
    global().get(path)
}
