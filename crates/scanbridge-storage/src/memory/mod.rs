//! In-process storage backend.
//!
//! The memory backend implements the engine interfaces on top of an
//! in-process catalog. When the configuration names a `snapshot_path`, the
//! catalog is loaded from that file on first open and written back after
//! each DDL and on flush/close. A DDL change becomes visible only once the
//! snapshot holding it has been saved.
//!
//! Sessions wait at most the configured `session_timeout_ms` for the
//! catalog; a session that times out fails with
//! [`StorageError::Connection`].
//!
//! Sessions opened through the same [`MemoryConnector`] with the same
//! snapshot path (or without one) share their data.

mod catalog;
mod session;
mod snapshot;
mod table;

pub use catalog::Catalog;
pub use session::{MemoryAdmin, MemoryScanner, MemoryStorage};
pub use snapshot::Snapshot;
pub use table::TableStore;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::api::{DistributedStorage, StorageAdmin, StorageConnector};
use crate::config::EngineConfig;
use crate::error::{StorageError, StorageResult};

/// Shared state behind memory sessions.
#[derive(Debug)]
pub struct MemoryEngine {
    catalog: RwLock<Catalog>,
    snapshot_path: Option<PathBuf>,
    dirty: AtomicBool,
}

impl MemoryEngine {
    /// Opens an engine, loading the snapshot file if it exists.
    fn open(snapshot_path: Option<&Path>) -> StorageResult<Self> {
        let catalog = match snapshot_path {
            Some(path) => match Snapshot::load(path)? {
                Some(snapshot) => {
                    let catalog = snapshot.restore()?;
                    info!("Loaded snapshot from {}", path.display());
                    catalog
                }
                None => Catalog::new(),
            },
            None => Catalog::new(),
        };

        Ok(Self {
            catalog: RwLock::new(catalog),
            snapshot_path: snapshot_path.map(Path::to_path_buf),
            dirty: AtomicBool::new(false),
        })
    }

    fn read_catalog(&self, timeout: Duration) -> StorageResult<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .try_read_for(timeout)
            .ok_or_else(|| lock_timeout(timeout))
    }

    fn write_catalog(&self, timeout: Duration) -> StorageResult<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .try_write_for(timeout)
            .ok_or_else(|| lock_timeout(timeout))
    }

    /// Applies a catalog change.
    ///
    /// With a snapshot file the change is made on a copy of the catalog, and
    /// the copy replaces the live catalog only after it has been saved.
    fn apply<T>(
        &self,
        timeout: Duration,
        change: impl FnOnce(&mut Catalog) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut catalog = self.write_catalog(timeout)?;
        let Some(path) = &self.snapshot_path else {
            return change(&mut catalog);
        };

        let mut staged = catalog.clone();
        let result = change(&mut staged)?;
        Snapshot::capture(&staged).save(path)?;
        *catalog = staged;
        self.dirty.store(false, Ordering::Release);
        debug!("Saved snapshot to {}", path.display());
        Ok(result)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Writes the snapshot if there are unsaved changes.
    fn persist_if_dirty(&self) -> StorageResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let snapshot = Snapshot::capture(&self.catalog.read());
        if let Err(e) = snapshot.save(path) {
            self.mark_dirty();
            return Err(e);
        }
        debug!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

fn lock_timeout(timeout: Duration) -> StorageError {
    StorageError::Connection(format!(
        "timed out after {:?} waiting for the memory engine",
        timeout
    ))
}

/// Connector for the memory backend.
///
/// Cloning a connector shares its engines.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    engines: Arc<Mutex<HashMap<Option<PathBuf>, Arc<MemoryEngine>>>>,
}

impl MemoryConnector {
    /// Creates a connector with no open engines.
    pub fn new() -> Self {
        Self::default()
    }

    fn engine(&self, config: &EngineConfig) -> StorageResult<Arc<MemoryEngine>> {
        let key = config.snapshot_path().map(Path::to_path_buf);
        let mut engines = self.engines.lock();
        if let Some(engine) = engines.get(&key) {
            return Ok(Arc::clone(engine));
        }

        let engine = MemoryEngine::open(key.as_deref()).map_err(|e| match key.as_deref() {
            Some(path) => StorageError::Connection(format!(
                "cannot open snapshot {}: {}",
                path.display(),
                e
            )),
            None => e,
        })?;
        let engine = Arc::new(engine);
        engines.insert(key, Arc::clone(&engine));
        Ok(engine)
    }
}

impl StorageConnector for MemoryConnector {
    fn parse_config(&self, config: &str) -> StorageResult<()> {
        EngineConfig::from_toml(config).map(|_| ())
    }

    fn open_storage(&self, config: &str) -> StorageResult<Arc<dyn DistributedStorage>> {
        let config = EngineConfig::from_toml(config)?;
        let engine = self.engine(&config)?;
        info!(
            "Opened memory data session (read_only: {}, timeout: {:?})",
            config.storage.read_only,
            config.session_timeout()
        );
        Ok(Arc::new(MemoryStorage::new(engine, &config)))
    }

    fn open_admin(&self, config: &str) -> StorageResult<Arc<dyn StorageAdmin>> {
        let config = EngineConfig::from_toml(config)?;
        let engine = self.engine(&config)?;
        info!(
            "Opened memory admin session (read_only: {})",
            config.storage.read_only
        );
        Ok(Arc::new(MemoryAdmin::new(engine, &config)))
    }
}
