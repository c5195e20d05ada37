//! # scanbridge-storage
//!
//! Storage engine boundary for ScanBridge.
//!
//! This crate defines what the access layer needs from a distributed
//! storage engine client:
//!
//! - **Values and keys**: typed column values, partition/clustering keys
//! - **Metadata**: table schemas with key columns, clustering orders and
//!   secondary indexes
//! - **Operations**: engine-native `Scan` and `Put` requests
//! - **Sessions**: the [`DistributedStorage`], [`StorageAdmin`] and
//!   [`StorageConnector`] traits
//!
//! It also ships an in-process backend ([`memory::MemoryConnector`]) that
//! can persist its data to a JSON snapshot file.
//!
//! ## Example
//!
//! ```rust
//! use scanbridge_storage::{
//!     DataType, Key, MemoryConnector, Put, Scan, StorageConnector, TableIdentifier,
//!     TableMetadata,
//! };
//!
//! let config = "[storage]\nbackend = \"memory\"\n";
//! let connector = MemoryConnector::new();
//! let admin = connector.open_admin(config).unwrap();
//! let storage = connector.open_storage(config).unwrap();
//!
//! let table = TableIdentifier::new("ns", "users");
//! admin.create_namespace("ns", true).unwrap();
//! admin
//!     .create_table(
//!         &table,
//!         TableMetadata::builder()
//!             .add_column("id", DataType::Int)
//!             .add_column("name", DataType::Text)
//!             .add_partition_key("id")
//!             .build()
//!             .unwrap(),
//!         true,
//!     )
//!     .unwrap();
//!
//! storage
//!     .put(&Put::new(table.clone(), Key::of("id", 1), Key::new()).value("name", "alice"))
//!     .unwrap();
//!
//! let mut scanner = storage.scan(&Scan::all(table)).unwrap();
//! let row = scanner.one().unwrap().unwrap();
//! assert_eq!(row.get_text("name").unwrap(), Some("alice"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod metadata;
pub mod operation;
pub mod result;
pub mod value;

pub use api::{DistributedStorage, Scanner, StorageAdmin, StorageConnector};
pub use config::{Backend, EngineConfig};
pub use error::{StorageError, StorageResult};
pub use key::{Key, TableIdentifier};
pub use memory::MemoryConnector;
pub use metadata::{ClusteringOrder, ColumnDef, TableMetadata, TableMetadataBuilder};
pub use operation::{Put, Scan, ScanBound, ScanOrdering, Selection};
pub use result::{Column, ResultRow};
pub use value::{DataType, Value};
