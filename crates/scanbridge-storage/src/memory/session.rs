//! Data and admin sessions of the memory backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{DistributedStorage, Scanner, StorageAdmin};
use crate::config::EngineConfig;
use crate::error::{StorageError, StorageResult};
use crate::key::TableIdentifier;
use crate::metadata::TableMetadata;
use crate::operation::{Put, Scan};
use crate::result::ResultRow;

use super::MemoryEngine;

/// State shared by both session kinds.
#[derive(Debug)]
struct SessionState {
    engine: Arc<MemoryEngine>,
    read_only: bool,
    timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl SessionState {
    fn new(engine: Arc<MemoryEngine>, config: &EngineConfig) -> Self {
        Self {
            engine,
            read_only: config.storage.read_only,
            timeout: config.session_timeout(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::SessionClosed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        Ok(())
    }

    /// Marks the session closed. Returns false if it was already closed.
    fn close(&self, kind: &str) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Err(e) = self.engine.persist_if_dirty() {
            warn!("Failed to persist snapshot while closing {} session: {}", kind, e);
        }
        info!("Closed memory {} session", kind);
        true
    }
}

// =============================================================================
// Data session
// =============================================================================

/// Data session over a [`MemoryEngine`].
#[derive(Debug)]
pub struct MemoryStorage {
    state: SessionState,
}

impl MemoryStorage {
    pub(crate) fn new(engine: Arc<MemoryEngine>, config: &EngineConfig) -> Self {
        Self {
            state: SessionState::new(engine, config),
        }
    }
}

impl DistributedStorage for MemoryStorage {
    fn scan(&self, scan: &Scan) -> StorageResult<Box<dyn Scanner>> {
        self.state.ensure_open()?;
        let rows = {
            let catalog = self.state.engine.read_catalog(self.state.timeout)?;
            catalog.table(&scan.table)?.scan(scan)?
        };
        debug!("{} returned {} rows", scan, rows.len());
        Ok(Box::new(MemoryScanner::new(
            rows,
            Arc::clone(&self.state.closed),
        )))
    }

    fn put(&self, put: &Put) -> StorageResult<()> {
        self.state.ensure_writable()?;
        {
            let mut catalog = self.state.engine.write_catalog(self.state.timeout)?;
            catalog.table_mut(&put.table)?.put(put)?;
        }
        self.state.engine.mark_dirty();
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        self.state.ensure_open()?;
        self.state.engine.persist_if_dirty()
    }

    fn close(&self) {
        self.state.close("data");
    }
}

impl Drop for MemoryStorage {
    fn drop(&mut self) {
        self.state.close("data");
    }
}

/// Cursor over materialized scan results.
///
/// The scanner observes the session's closed flag: once the session is
/// closed, pending rows can no longer be read.
#[derive(Debug)]
pub struct MemoryScanner {
    rows: std::vec::IntoIter<ResultRow>,
    session_closed: Arc<AtomicBool>,
    done: bool,
}

impl MemoryScanner {
    fn new(rows: Vec<ResultRow>, session_closed: Arc<AtomicBool>) -> Self {
        Self {
            rows: rows.into_iter(),
            session_closed,
            done: false,
        }
    }
}

impl Scanner for MemoryScanner {
    fn one(&mut self) -> StorageResult<Option<ResultRow>> {
        if self.done {
            return Ok(None);
        }
        if self.session_closed.load(Ordering::Acquire) {
            self.close();
            return Err(StorageError::SessionClosed);
        }
        let row = self.rows.next();
        if row.is_none() {
            self.close();
        }
        Ok(row)
    }

    fn close(&mut self) {
        self.done = true;
        self.rows = Vec::new().into_iter();
    }
}

// =============================================================================
// Admin session
// =============================================================================

/// Admin session over a [`MemoryEngine`].
#[derive(Debug)]
pub struct MemoryAdmin {
    state: SessionState,
}

impl MemoryAdmin {
    pub(crate) fn new(engine: Arc<MemoryEngine>, config: &EngineConfig) -> Self {
        Self {
            state: SessionState::new(engine, config),
        }
    }

    /// Runs a catalog change and persists it right away.
    fn ddl<T>(
        &self,
        change: impl FnOnce(&mut super::catalog::Catalog) -> StorageResult<T>,
    ) -> StorageResult<T> {
        self.state.ensure_writable()?;
        self.state.engine.apply(self.state.timeout, change)
    }
}

impl StorageAdmin for MemoryAdmin {
    fn create_namespace(&self, namespace: &str, if_not_exists: bool) -> StorageResult<()> {
        let created = self.ddl(|catalog| catalog.create_namespace(namespace, if_not_exists))?;
        if created {
            info!("Created namespace {}", namespace);
        }
        Ok(())
    }

    fn namespace_exists(&self, namespace: &str) -> StorageResult<bool> {
        self.state.ensure_open()?;
        Ok(self
            .state
            .engine
            .read_catalog(self.state.timeout)?
            .namespace_exists(namespace))
    }

    fn create_table(
        &self,
        table: &TableIdentifier,
        metadata: TableMetadata,
        if_not_exists: bool,
    ) -> StorageResult<()> {
        let created = self.ddl(|catalog| catalog.create_table(table, metadata, if_not_exists))?;
        if created {
            info!("Created table {}", table);
        }
        Ok(())
    }

    fn truncate_table(&self, table: &TableIdentifier) -> StorageResult<()> {
        self.ddl(|catalog| {
            catalog.table_mut(table)?.truncate();
            Ok(())
        })?;
        info!("Truncated table {}", table);
        Ok(())
    }

    fn drop_table(&self, table: &TableIdentifier) -> StorageResult<()> {
        self.ddl(|catalog| catalog.drop_table(table))?;
        info!("Dropped table {}", table);
        Ok(())
    }

    fn table_metadata(&self, table: &TableIdentifier) -> StorageResult<Option<TableMetadata>> {
        self.state.ensure_open()?;
        Ok(self
            .state
            .engine
            .read_catalog(self.state.timeout)?
            .metadata(table))
    }

    fn close(&self) {
        self.state.close("admin");
    }
}

impl Drop for MemoryAdmin {
    fn drop(&mut self) {
        self.state.close("admin");
    }
}
