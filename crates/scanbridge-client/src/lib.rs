//! # scanbridge-client
//!
//! Access layer that lets an external query engine read rows from a
//! distributed storage engine as if they were relational tables.
//!
//! This crate provides:
//!
//! - **Connection Management**: one lazily opened connection per process,
//!   owned by a [`ConnectionRegistry`]
//! - **Scan Descriptors**: full, partition and secondary index scans
//! - **Metadata**: partition keys, clustering keys and orders, indexes
//! - **Results**: a lazy [`ResultSequence`] and a [`ResultAdapter`]
//! - **Planning Hooks**: condition pushdown, clustering sorts, row estimates
//! - **Options**: foreign server and foreign table option validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scanbridge_client::{build_partition_scan, column_count, ConnectionRegistry};
//! use scanbridge_storage::{Key, MemoryConnector, TableIdentifier};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ConnectionRegistry::new(MemoryConnector::new());
//!     registry.initialize("/etc/scanbridge/engine.toml")?;
//!
//!     let table = TableIdentifier::new("ns", "users");
//!     let pk = registry.metadata().partition_key_names(&table)?;
//!     println!("partition key: {:?}", pk);
//!
//!     let scan = build_partition_scan(table, Key::of("id", 1));
//!     for row in registry.scan(&scan)? {
//!         let row = row?;
//!         println!("{} columns: {}", column_count(&row), row);
//!     }
//!
//!     registry.close();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// Connection registry.
pub mod registry;

/// Scan descriptors.
pub mod scan;

/// Metadata service.
pub mod metadata;

/// Result sequences and adapters.
pub mod result;

/// Planning hooks.
pub mod planner;

/// Foreign object options.
pub mod options;

pub use error::{BridgeError, BridgeResult};
pub use metadata::{ColumnMetadata, MetadataService};
pub use options::{validate_options, ForeignTableOptions, OptionContext};
pub use planner::{
    clustering_sort, determine_remote_conditions, estimate_rows, AccessPath, CompareOp, Condition,
    ScanPlan, DEFAULT_ROWS_FOR_PARTITION_KEY_SCAN,
};
pub use registry::{Connection, ConnectionRegistry};
pub use result::{column_count, ResultAdapter, ResultSequence};
pub use scan::{
    build_full_scan, build_index_scan, build_partition_scan, ClusteringRange, ScanDescriptor,
    ScanKind, ScanOptions,
};
