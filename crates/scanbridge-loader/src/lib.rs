//! # scanbridge-loader
//!
//! Creates the fixture namespaces and tables used by integration tests and
//! fills them with a fixed set of rows.
//!
//! Tables that already exist are truncated instead of recreated, so loading
//! twice leaves the same data behind.

use scanbridge_storage::{
    DataType, DistributedStorage, Key, Put, StorageAdmin, StorageResult, TableIdentifier,
    TableMetadata, Value,
};
use tracing::info;

/// Namespace of the tables with `c_` prefixed columns.
pub const CASSANDRA_NAMESPACE: &str = "cassandrans";
/// Namespace of the tables with `p_` prefixed columns and the per-type tables.
pub const POSTGRES_NAMESPACE: &str = "postgresns";

/// Name of the all-types table in both namespaces.
pub const TEST_TABLE: &str = "test";
/// Name of the table whose only row has every non-key column unset.
pub const NULL_TEST_TABLE: &str = "null_test";

/// Per-type tables with columns `pk`, `ck`, `index`, `col`, paired with
/// their column type.
pub const TYPE_TABLES: [(&str, DataType); 7] = [
    ("boolean_test", DataType::Boolean),
    ("int_test", DataType::Int),
    ("bigint_test", DataType::BigInt),
    ("float_test", DataType::Float),
    ("double_test", DataType::Double),
    ("text_test", DataType::Text),
    ("blob_test", DataType::Blob),
];

/// What a load did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Tables created.
    pub tables_created: usize,
    /// Existing tables truncated.
    pub tables_truncated: usize,
    /// Rows written.
    pub rows_written: usize,
}

/// Returns every fixture table with its metadata.
pub fn fixture_tables() -> StorageResult<Vec<(TableIdentifier, TableMetadata)>> {
    let mut tables = vec![
        (
            TableIdentifier::new(CASSANDRA_NAMESPACE, TEST_TABLE),
            all_types_metadata("c")?,
        ),
        (
            TableIdentifier::new(POSTGRES_NAMESPACE, TEST_TABLE),
            all_types_metadata("p")?,
        ),
        (
            TableIdentifier::new(POSTGRES_NAMESPACE, NULL_TEST_TABLE),
            all_types_metadata("p")?,
        ),
    ];
    for (name, data_type) in TYPE_TABLES {
        tables.push((
            TableIdentifier::new(POSTGRES_NAMESPACE, name),
            single_type_metadata(data_type)?,
        ));
    }
    Ok(tables)
}

fn all_types_metadata(prefix: &str) -> StorageResult<TableMetadata> {
    let column = |name: &str| format!("{}_{}", prefix, name);
    TableMetadata::builder()
        .add_column(column("pk"), DataType::Int)
        .add_column(column("ck1"), DataType::Int)
        .add_column(column("ck2"), DataType::Int)
        .add_column(column("boolean_col"), DataType::Boolean)
        .add_column(column("int_col"), DataType::Int)
        .add_column(column("bigint_col"), DataType::BigInt)
        .add_column(column("float_col"), DataType::Float)
        .add_column(column("double_col"), DataType::Double)
        .add_column(column("text_col"), DataType::Text)
        .add_column(column("blob_col"), DataType::Blob)
        .add_partition_key(column("pk"))
        .add_clustering_key(column("ck1"))
        .add_clustering_key(column("ck2"))
        .build()
}

fn single_type_metadata(data_type: DataType) -> StorageResult<TableMetadata> {
    TableMetadata::builder()
        .add_column("pk", data_type)
        .add_column("ck", data_type)
        .add_column("index", data_type)
        .add_column("col", data_type)
        .add_partition_key("pk")
        .add_clustering_key("ck")
        .add_secondary_index("index")
        .build()
}

/// Distinct sample values of a type, in ascending order.
pub fn sample_values(data_type: DataType) -> Vec<Value> {
    match data_type {
        DataType::Boolean => vec![Value::Boolean(false), Value::Boolean(true)],
        DataType::Int => vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        DataType::BigInt => vec![Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)],
        DataType::Float => vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)],
        DataType::Double => vec![Value::Double(1.0), Value::Double(2.0), Value::Double(3.0)],
        DataType::Text => vec![Value::text("a"), Value::text("b"), Value::text("c")],
        DataType::Blob => vec![
            Value::blob(vec![1u8]),
            Value::blob(vec![2u8]),
            Value::blob(vec![3u8]),
        ],
    }
}

/// Creates the fixture schema and loads the fixture rows.
pub fn load_fixtures(
    storage: &dyn DistributedStorage,
    admin: &dyn StorageAdmin,
) -> StorageResult<LoadSummary> {
    let mut summary = LoadSummary::default();

    info!("Creating namespaces");
    admin.create_namespace(CASSANDRA_NAMESPACE, true)?;
    admin.create_namespace(POSTGRES_NAMESPACE, true)?;

    for (table, metadata) in fixture_tables()? {
        if admin.table_exists(&table)? {
            info!("{} already exists. Truncating it", table);
            admin.truncate_table(&table)?;
            summary.tables_truncated += 1;
        } else {
            info!("Creating {} table", table);
            admin.create_table(&table, metadata, true)?;
            summary.tables_created += 1;
        }
    }

    for put in fixture_rows() {
        storage.put(&put)?;
        summary.rows_written += 1;
    }

    info!(
        "Loaded {} rows ({} tables created, {} truncated)",
        summary.rows_written, summary.tables_created, summary.tables_truncated
    );
    Ok(summary)
}

/// Returns the fixture rows.
pub fn fixture_rows() -> Vec<Put> {
    let mut rows = vec![
        all_types_row(CASSANDRA_NAMESPACE, "c"),
        all_types_row(POSTGRES_NAMESPACE, "p"),
        Put::new(
            TableIdentifier::new(POSTGRES_NAMESPACE, NULL_TEST_TABLE),
            Key::of("p_pk", 1),
            Key::of("p_ck1", 1).with("p_ck2", 1),
        ),
    ];

    for (name, data_type) in TYPE_TABLES {
        let table = TableIdentifier::new(POSTGRES_NAMESPACE, name);
        let samples = sample_values(data_type);
        for (i, ck) in samples.iter().enumerate() {
            rows.push(
                Put::new(
                    table.clone(),
                    Key::of("pk", samples[0].clone()),
                    Key::of("ck", ck.clone()),
                )
                .value("index", samples[i % 2].clone())
                .value("col", ck.clone()),
            );
        }
    }
    rows
}

fn all_types_row(namespace: &str, prefix: &str) -> Put {
    let column = |name: &str| format!("{}_{}", prefix, name);
    Put::new(
        TableIdentifier::new(namespace, TEST_TABLE),
        Key::of(column("pk"), 1),
        Key::of(column("ck1"), 1).with(column("ck2"), 1),
    )
    .value(column("boolean_col"), true)
    .value(column("int_col"), 1)
    .value(column("bigint_col"), 1i64)
    .value(column("float_col"), 1.0f32)
    .value(column("double_col"), 1.0f64)
    .value(column("text_col"), "test")
    .value(column("blob_col"), vec![1u8, 2, 3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbridge_storage::{MemoryConnector, Scan, StorageConnector};

    const CONFIG: &str = "[storage]\nbackend = \"memory\"\n";

    fn count_rows(storage: &dyn DistributedStorage, table: &TableIdentifier) -> usize {
        let mut scanner = storage.scan(&Scan::all(table.clone())).unwrap();
        let mut n = 0;
        while scanner.one().unwrap().is_some() {
            n += 1;
        }
        n
    }

    #[test]
    fn test_fixture_tables() {
        let tables = fixture_tables().unwrap();
        assert_eq!(tables.len(), 10);

        let (_, blob) = tables
            .iter()
            .find(|(id, _)| id.table() == "blob_test")
            .unwrap();
        assert_eq!(blob.column_type("index"), Some(DataType::Blob));
        assert!(blob.secondary_index_names().contains("index"));
    }

    #[test]
    fn test_load_twice() {
        let connector = MemoryConnector::new();
        let storage = connector.open_storage(CONFIG).unwrap();
        let admin = connector.open_admin(CONFIG).unwrap();

        let first = load_fixtures(storage.as_ref(), admin.as_ref()).unwrap();
        assert_eq!(first.tables_created, 10);
        assert_eq!(first.tables_truncated, 0);
        assert_eq!(first.rows_written, fixture_rows().len());

        let second = load_fixtures(storage.as_ref(), admin.as_ref()).unwrap();
        assert_eq!(second.tables_created, 0);
        assert_eq!(second.tables_truncated, 10);

        let int_test = TableIdentifier::new(POSTGRES_NAMESPACE, "int_test");
        assert_eq!(count_rows(storage.as_ref(), &int_test), 3);
        let boolean_test = TableIdentifier::new(POSTGRES_NAMESPACE, "boolean_test");
        assert_eq!(count_rows(storage.as_ref(), &boolean_test), 2);
    }

    #[test]
    fn test_reload_into_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = format!(
            "[storage]\nbackend = \"memory\"\nsnapshot_path = {:?}\n",
            dir.path().join("fixtures.json").display().to_string()
        );

        for _ in 0..2 {
            let connector = MemoryConnector::new();
            let storage = connector.open_storage(&config).unwrap();
            let admin = connector.open_admin(&config).unwrap();
            load_fixtures(storage.as_ref(), admin.as_ref()).unwrap();
            storage.flush().unwrap();
        }

        let storage = MemoryConnector::new().open_storage(&config).unwrap();
        let test_table = TableIdentifier::new(CASSANDRA_NAMESPACE, TEST_TABLE);
        assert_eq!(count_rows(storage.as_ref(), &test_table), 1);
        let int_test = TableIdentifier::new(POSTGRES_NAMESPACE, "int_test");
        assert_eq!(count_rows(storage.as_ref(), &int_test), 3);
    }

    #[test]
    fn test_null_row() {
        let connector = MemoryConnector::new();
        let storage = connector.open_storage(CONFIG).unwrap();
        let admin = connector.open_admin(CONFIG).unwrap();
        load_fixtures(storage.as_ref(), admin.as_ref()).unwrap();

        let table = TableIdentifier::new(POSTGRES_NAMESPACE, NULL_TEST_TABLE);
        let mut scanner = storage.scan(&Scan::all(table)).unwrap();
        let row = scanner.one().unwrap().unwrap();
        assert_eq!(row.num_columns(), 10);
        assert_eq!(row.num_non_null(), 3);
        assert_eq!(row.get_text("p_text_col").unwrap(), None);
    }
}
