//! Connection registry.
//!
//! The registry owns at most one live [`Connection`] per hosting process.
//! The connection is created lazily by [`ConnectionRegistry::initialize`] and
//! released by [`ConnectionRegistry::close`].
//!
//! ## Example
//!
//! ```rust
//! use scanbridge_client::{build_full_scan, ConnectionRegistry};
//! use scanbridge_storage::{MemoryConnector, TableIdentifier};
//!
//! let registry = ConnectionRegistry::new(MemoryConnector::new());
//! registry.initialize_with("[storage]\nbackend = \"memory\"\n").unwrap();
//! assert!(registry.is_initialized());
//!
//! let result = registry.scan(&build_full_scan(TableIdentifier::new("ns", "missing")));
//! assert!(result.is_err());
//!
//! registry.close();
//! assert!(registry.connection().is_err());
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use scanbridge_storage::{
    DistributedStorage, MemoryConnector, StorageAdmin, StorageConnector, StorageError,
};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::metadata::MetadataService;
use crate::result::ResultSequence;
use crate::scan::ScanDescriptor;

/// Path reported in config errors for configuration text given directly.
const INLINE_CONFIG: &str = "<inline>";

/// A data session and an admin session to the storage engine.
pub struct Connection {
    storage: Arc<dyn DistributedStorage>,
    admin: Arc<dyn StorageAdmin>,
}

impl Connection {
    /// Creates a connection from open sessions.
    pub fn new(storage: Arc<dyn DistributedStorage>, admin: Arc<dyn StorageAdmin>) -> Self {
        Self { storage, admin }
    }

    /// Returns the data session.
    pub fn storage(&self) -> &Arc<dyn DistributedStorage> {
        &self.storage
    }

    /// Returns the admin session.
    pub fn admin(&self) -> &Arc<dyn StorageAdmin> {
        &self.admin
    }

    /// Executes a scan descriptor.
    pub fn scan(&self, descriptor: &ScanDescriptor) -> BridgeResult<ResultSequence> {
        debug!("Executing {}", descriptor);
        let scanner = self.storage.scan(&descriptor.to_scan())?;
        Ok(ResultSequence::new(scanner, descriptor.to_string()))
    }

    fn close(&self) {
        self.storage.close();
        self.admin.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Owner of the process-wide storage connection.
pub struct ConnectionRegistry {
    connector: Arc<dyn StorageConnector>,
    init_lock: Mutex<()>,
    connection: RwLock<Option<Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Creates an uninitialized registry using `connector` to open sessions.
    pub fn new(connector: impl StorageConnector + 'static) -> Self {
        Self::with_connector(Arc::new(connector))
    }

    /// Creates an uninitialized registry from a shared connector.
    pub fn with_connector(connector: Arc<dyn StorageConnector>) -> Self {
        Self {
            connector,
            init_lock: Mutex::new(()),
            connection: RwLock::new(None),
        }
    }

    /// Opens the connection using the configuration file at `config_path`.
    ///
    /// Does nothing if a connection is already open; the file is not read
    /// again in that case.
    pub fn initialize(&self, config_path: impl AsRef<Path>) -> BridgeResult<()> {
        let path = config_path.as_ref();
        self.initialize_inner(path, || {
            fs::read_to_string(path).map_err(|e| BridgeError::config(path, e.to_string()))
        })
    }

    /// Opens the connection using configuration text.
    pub fn initialize_with(&self, config: &str) -> BridgeResult<()> {
        self.initialize_inner(Path::new(INLINE_CONFIG), || Ok(config.to_string()))
    }

    fn initialize_inner(
        &self,
        path: &Path,
        load: impl FnOnce() -> BridgeResult<String>,
    ) -> BridgeResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let _guard = self.init_lock.lock();
        if self.is_initialized() {
            return Ok(());
        }

        let config = load()?;
        let connection = self.open(path, &config)?;
        *self.connection.write() = Some(Arc::new(connection));
        info!("Connected to storage engine using {}", path.display());
        Ok(())
    }

    fn open(&self, path: &Path, config: &str) -> BridgeResult<Connection> {
        self.connector
            .parse_config(config)
            .map_err(|e| BridgeError::config(path, e.to_string()))?;

        let storage = self
            .connector
            .open_storage(config)
            .map_err(|e| connect_error(path, "cannot open data session", e))?;

        let admin = match self.connector.open_admin(config) {
            Ok(admin) => admin,
            Err(e) => {
                warn!("Opening admin session failed, closing data session: {}", e);
                storage.close();
                return Err(connect_error(path, "cannot open admin session", e));
            }
        };

        Ok(Connection::new(storage, admin))
    }

    /// Returns the live connection.
    pub fn connection(&self) -> BridgeResult<Arc<Connection>> {
        self.connection
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(BridgeError::NotInitialized)
    }

    /// Returns true if a connection is open.
    pub fn is_initialized(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Closes the connection. Does nothing if none is open.
    pub fn close(&self) {
        let _guard = self.init_lock.lock();
        if let Some(connection) = self.connection.write().take() {
            connection.close();
            info!("Closed storage engine connection");
        }
    }

    /// Executes a scan descriptor on the live connection.
    pub fn scan(&self, descriptor: &ScanDescriptor) -> BridgeResult<ResultSequence> {
        self.connection()?.scan(descriptor)
    }

    /// Returns the metadata service.
    pub fn metadata(&self) -> MetadataService<'_> {
        MetadataService::new(self)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(MemoryConnector::new())
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            warn!("Connection registry dropped without close(), closing connection");
            connection.close();
        }
    }
}

fn connect_error(path: &Path, what: &str, source: StorageError) -> BridgeError {
    if source.is_config() {
        return BridgeError::Config {
            path: PathBuf::from(path),
            message: source.to_string(),
        };
    }
    BridgeError::Connection {
        message: format!("{}: {}", what, source),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use scanbridge_storage::StorageResult;

    const CONFIG: &str = "[storage]\nbackend = \"memory\"\n";

    /// Connector wrapper that counts sessions and can fail on demand.
    #[derive(Default)]
    struct CountingConnector {
        inner: MemoryConnector,
        parsed: AtomicUsize,
        storage_opened: AtomicUsize,
        admin_opened: AtomicUsize,
        fail_storage: bool,
        fail_admin: bool,
        opened: Mutex<Vec<Arc<dyn DistributedStorage>>>,
    }

    impl StorageConnector for CountingConnector {
        fn parse_config(&self, config: &str) -> StorageResult<()> {
            self.parsed.fetch_add(1, Ordering::SeqCst);
            self.inner.parse_config(config)
        }

        fn open_storage(&self, config: &str) -> StorageResult<Arc<dyn DistributedStorage>> {
            if self.fail_storage {
                return Err(StorageError::Connection("unreachable".to_string()));
            }
            self.storage_opened.fetch_add(1, Ordering::SeqCst);
            let storage = self.inner.open_storage(config)?;
            self.opened.lock().push(Arc::clone(&storage));
            Ok(storage)
        }

        fn open_admin(&self, config: &str) -> StorageResult<Arc<dyn StorageAdmin>> {
            if self.fail_admin {
                return Err(StorageError::Connection("unreachable".to_string()));
            }
            self.admin_opened.fetch_add(1, Ordering::SeqCst);
            self.inner.open_admin(config)
        }
    }

    fn counting(connector: CountingConnector) -> (ConnectionRegistry, Arc<CountingConnector>) {
        let connector = Arc::new(connector);
        let registry = ConnectionRegistry::with_connector(Arc::clone(&connector) as _);
        (registry, connector)
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (registry, connector) = counting(CountingConnector::default());
        registry.initialize_with(CONFIG).unwrap();
        let first = registry.connection().unwrap();

        registry.initialize_with(CONFIG).unwrap();
        registry.initialize("/nonexistent/config.toml").unwrap();
        let second = registry.connection().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.parsed.load(Ordering::SeqCst), 1);
        assert_eq!(connector.storage_opened.load(Ordering::SeqCst), 1);
        assert_eq!(connector.admin_opened.load(Ordering::SeqCst), 1);
        registry.close();
    }

    #[test]
    fn test_initialize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(&path, CONFIG).unwrap();

        let registry = ConnectionRegistry::default();
        registry.initialize(&path).unwrap();
        assert!(registry.is_initialized());
        registry.close();
    }

    #[test]
    fn test_unreadable_config_path() {
        let registry = ConnectionRegistry::default();
        match registry.initialize("/nonexistent/scanbridge.toml") {
            Err(BridgeError::Config { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/scanbridge.toml"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_malformed_config() {
        let (registry, connector) = counting(CountingConnector::default());
        let err = registry.initialize_with("[storage\nbackend =").unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
        assert_eq!(connector.storage_opened.load(Ordering::SeqCst), 0);
        assert!(matches!(registry.connection(), Err(BridgeError::NotInitialized)));
    }

    #[test]
    fn test_unreachable_engine() {
        let (registry, _) = counting(CountingConnector {
            fail_storage: true,
            ..Default::default()
        });
        let err = registry.initialize_with(CONFIG).unwrap_err();
        assert!(matches!(err, BridgeError::Connection { .. }));
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_partial_initialization_closes_data_session() {
        let (registry, connector) = counting(CountingConnector {
            fail_admin: true,
            ..Default::default()
        });
        let err = registry.initialize_with(CONFIG).unwrap_err();
        assert!(matches!(err, BridgeError::Connection { .. }));
        assert!(!registry.is_initialized());

        let opened = connector.opened.lock();
        assert_eq!(opened.len(), 1);
        let scan = scanbridge_storage::Scan::all(scanbridge_storage::TableIdentifier::new("a", "b"));
        assert!(matches!(
            opened[0].scan(&scan),
            Err(StorageError::SessionClosed)
        ));
    }

    #[test]
    fn test_concurrent_first_initialize() {
        let (registry, connector) = counting(CountingConnector::default());
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.initialize_with(CONFIG))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(connector.storage_opened.load(Ordering::SeqCst), 1);
        assert_eq!(connector.admin_opened.load(Ordering::SeqCst), 1);
        registry.close();
    }

    #[test]
    fn test_close() {
        let registry = ConnectionRegistry::default();
        registry.close();
        assert!(matches!(registry.connection(), Err(BridgeError::NotInitialized)));

        registry.initialize_with(CONFIG).unwrap();
        let held = registry.connection().unwrap();
        registry.close();
        registry.close();

        assert!(matches!(registry.connection(), Err(BridgeError::NotInitialized)));
        assert!(matches!(
            registry.scan(&crate::scan::build_full_scan(
                scanbridge_storage::TableIdentifier::new("a", "b")
            )),
            Err(BridgeError::NotInitialized)
        ));
        assert!(matches!(
            held.storage()
                .scan(&scanbridge_storage::Scan::all(scanbridge_storage::TableIdentifier::new(
                    "a", "b"
                ))),
            Err(StorageError::SessionClosed)
        ));

        registry.initialize_with(CONFIG).unwrap();
        assert!(registry.is_initialized());
        registry.close();
    }
}
