//! # scanbridge-test
//!
//! End-to-end tests for ScanBridge.
//!
//! This crate contains:
//! - Test utilities for snapshot-backed engines and fixture loading
//! - Integration tests covering fixtures, registry, scans and metadata

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Once;

    use scanbridge_client::ConnectionRegistry;
    use scanbridge_loader::load_fixtures;
    use scanbridge_storage::{MemoryConnector, ResultRow};
    use tempfile::TempDir;
    use tracing_subscriber::EnvFilter;

    static LOGGING: Once = Once::new();

    /// Installs a test log subscriber once. Honors `RUST_LOG`.
    pub fn init_test_logging() {
        LOGGING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    /// A snapshot-backed engine configuration in a temporary directory.
    pub struct TestEngine {
        dir: TempDir,
        config_path: PathBuf,
    }

    impl TestEngine {
        /// Writes a configuration file pointing at a fresh snapshot.
        pub fn new() -> std::io::Result<Self> {
            let dir = tempfile::tempdir()?;
            let snapshot = dir.path().join("snapshot.json");
            let config_path = dir.path().join("engine.toml");
            fs::write(
                &config_path,
                format!(
                    "[storage]\nbackend = \"memory\"\nsnapshot_path = {:?}\n",
                    snapshot.display().to_string()
                ),
            )?;
            Ok(Self { dir, config_path })
        }

        /// Returns the configuration file path.
        pub fn config_path(&self) -> &Path {
            &self.config_path
        }

        /// Returns the snapshot file path.
        pub fn snapshot_path(&self) -> PathBuf {
            self.dir.path().join("snapshot.json")
        }

        /// Opens a registry over a new connector.
        pub fn registry(&self) -> ConnectionRegistry {
            init_test_logging();
            let registry = ConnectionRegistry::new(MemoryConnector::new());
            registry
                .initialize(&self.config_path)
                .expect("failed to initialize registry");
            registry
        }

        /// Loads the fixtures and persists them.
        pub fn load_fixtures(&self) {
            let registry = self.registry();
            let connection = registry.connection().expect("not initialized");
            load_fixtures(connection.storage().as_ref(), connection.admin().as_ref())
                .expect("failed to load fixtures");
            connection.storage().flush().expect("failed to flush");
            registry.close();
        }
    }

    /// Collects every row of a result sequence, panicking on errors.
    pub fn collect_rows<I>(rows: I) -> Vec<ResultRow>
    where
        I: IntoIterator<Item = scanbridge_client::BridgeResult<ResultRow>>,
    {
        rows.into_iter()
            .map(|r| r.expect("scan failed"))
            .collect()
    }
}
