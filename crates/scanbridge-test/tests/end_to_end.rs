//! End-to-end tests for ScanBridge.
//!
//! These tests load the fixtures into a snapshot-backed engine, then read
//! them back through a fresh registry: descriptors, scans, the result
//! adapter and the metadata service.

use scanbridge_client::{
    build_full_scan, build_index_scan, build_partition_scan, clustering_sort, column_count,
    determine_remote_conditions, BridgeError, CompareOp, Condition, ConnectionRegistry,
    ForeignTableOptions, ResultAdapter, ScanKind,
};
use scanbridge_loader::{
    sample_values, CASSANDRA_NAMESPACE, NULL_TEST_TABLE, POSTGRES_NAMESPACE, TEST_TABLE,
    TYPE_TABLES,
};
use scanbridge_storage::{
    ClusteringOrder, DataType, Key, MemoryConnector, Put, ScanOrdering, StorageError,
    TableIdentifier, TableMetadata, Value,
};
use scanbridge_test::utils::{collect_rows, init_test_logging, TestEngine};

fn loaded_engine() -> TestEngine {
    let engine = TestEngine::new().expect("failed to create test engine");
    engine.load_fixtures();
    engine
}

// =============================================================================
// Scans
// =============================================================================

#[test]
fn test_full_scan_single_row() {
    init_test_logging();
    let registry = ConnectionRegistry::new(MemoryConnector::new());
    registry
        .initialize_with("[storage]\nbackend = \"memory\"\n")
        .unwrap();

    let table = TableIdentifier::new("ns", "tbl");
    let connection = registry.connection().unwrap();
    connection.admin().create_namespace("ns", true).unwrap();
    connection
        .admin()
        .create_table(
            &table,
            TableMetadata::builder()
                .add_column("pk", DataType::Int)
                .add_column("ck1", DataType::Int)
                .add_column("ck2", DataType::Int)
                .add_column("col", DataType::Text)
                .add_partition_key("pk")
                .add_clustering_key("ck1")
                .add_clustering_key("ck2")
                .build()
                .unwrap(),
            true,
        )
        .unwrap();
    connection
        .storage()
        .put(
            &Put::new(table.clone(), Key::of("pk", 1), Key::of("ck1", 1).with("ck2", 1))
                .value("col", "test"),
        )
        .unwrap();

    let rows = collect_rows(registry.scan(&build_full_scan(table)).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(column_count(&rows[0]), 4);
    assert_eq!(rows[0].get_text("col").unwrap(), Some("test"));

    registry.close();
}

#[test]
fn test_fixture_rows_survive_reconnect() {
    let engine = loaded_engine();
    let registry = engine.registry();

    for (namespace, prefix) in [(CASSANDRA_NAMESPACE, "c"), (POSTGRES_NAMESPACE, "p")] {
        let table = TableIdentifier::new(namespace, TEST_TABLE);
        let rows = collect_rows(registry.scan(&build_full_scan(table)).unwrap());
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        let column = |name: &str| format!("{}_{}", prefix, name);
        assert_eq!(column_count(row), 10);
        assert_eq!(row.get_boolean(&column("boolean_col")).unwrap(), Some(true));
        assert_eq!(row.get_int(&column("int_col")).unwrap(), Some(1));
        assert_eq!(row.get_bigint(&column("bigint_col")).unwrap(), Some(1));
        assert_eq!(row.get_float(&column("float_col")).unwrap(), Some(1.0));
        assert_eq!(row.get_double(&column("double_col")).unwrap(), Some(1.0));
        assert_eq!(row.get_text(&column("text_col")).unwrap(), Some("test"));
        assert_eq!(
            row.get_blob(&column("blob_col")).unwrap(),
            Some(&[1u8, 2, 3][..])
        );
    }

    assert!(engine.snapshot_path().exists());
    registry.close();
}

#[test]
fn test_partition_scan() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let table = TableIdentifier::new(POSTGRES_NAMESPACE, TEST_TABLE);

    let scan = build_partition_scan(table.clone(), Key::of("p_pk", 1))
        .with_projections(["p_pk", "p_text_col"]);
    let rows = collect_rows(registry.scan(&scan).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(column_count(&rows[0]), 2);

    let empty = build_partition_scan(table, Key::of("p_pk", 2));
    assert!(collect_rows(registry.scan(&empty).unwrap()).is_empty());

    registry.close();
}

#[test]
fn test_partition_key_mismatch_fails_at_execution() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let table = TableIdentifier::new(POSTGRES_NAMESPACE, TEST_TABLE);

    let wrong_column = build_partition_scan(table.clone(), Key::of("p_ck1", 1));
    assert_eq!(wrong_column.kind(), ScanKind::Partition);
    assert!(matches!(
        registry.scan(&wrong_column),
        Err(BridgeError::EngineQuery(StorageError::InvalidScan { .. }))
    ));

    let wrong_type = build_partition_scan(table.clone(), Key::of("p_pk", "1"));
    assert!(matches!(
        registry.scan(&wrong_type),
        Err(BridgeError::EngineQuery(_))
    ));

    let missing_table = build_full_scan(TableIdentifier::new(POSTGRES_NAMESPACE, "missing"));
    let err = registry.scan(&missing_table).unwrap_err();
    assert!(err.is_recoverable());

    registry.close();
}

#[test]
fn test_index_scan_per_type() {
    let engine = loaded_engine();
    let registry = engine.registry();

    for (name, data_type) in TYPE_TABLES {
        let table = TableIdentifier::new(POSTGRES_NAMESPACE, name);
        let samples = sample_values(data_type);
        let wanted = samples[1].clone();

        let scan = build_index_scan(table.clone(), Key::of("index", wanted.clone()));
        let rows = collect_rows(registry.scan(&scan).unwrap());
        assert_eq!(rows.len(), 1, "{}", table);
        assert!(rows.iter().all(|row| row.get("index") == Some(&wanted)));

        let scan = build_index_scan(table.clone(), Key::of("index", samples[0].clone()));
        let rows = collect_rows(registry.scan(&scan).unwrap());
        assert_eq!(rows.len(), samples.len() - 1, "{}", table);
    }

    let not_indexed = build_index_scan(
        TableIdentifier::new(POSTGRES_NAMESPACE, "int_test"),
        Key::of("col", 1),
    );
    assert!(matches!(
        registry.scan(&not_indexed),
        Err(BridgeError::EngineQuery(_))
    ));

    registry.close();
}

#[test]
fn test_null_row() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let table = TableIdentifier::new(POSTGRES_NAMESPACE, NULL_TEST_TABLE);

    let rows = collect_rows(registry.scan(&build_full_scan(table)).unwrap());
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(column_count(row), 10);
    assert_eq!(row.num_non_null(), 3);
    assert!(row.is_null("p_boolean_col").unwrap());
    assert_eq!(row.get_blob("p_blob_col").unwrap(), None);

    let adapter = ResultAdapter::new(["p_pk", "p_text_col"]);
    assert_eq!(adapter.adapt(row), vec![Some(Value::Int(1)), None]);

    registry.close();
}

#[test]
fn test_scan_after_close() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let scan = build_full_scan(TableIdentifier::new(POSTGRES_NAMESPACE, TEST_TABLE));

    registry.close();
    assert!(matches!(registry.scan(&scan), Err(BridgeError::NotInitialized)));
}

// =============================================================================
// Metadata
// =============================================================================

#[test]
fn test_metadata_of_fixture_tables() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let metadata = registry.metadata();

    let table = TableIdentifier::new(CASSANDRA_NAMESPACE, TEST_TABLE);
    assert_eq!(metadata.partition_key_names(&table).unwrap(), vec!["c_pk"]);
    assert_eq!(
        metadata.clustering_key_names(&table).unwrap(),
        vec!["c_ck1", "c_ck2"]
    );
    assert!(metadata.secondary_index_names(&table).unwrap().is_empty());
    assert_eq!(
        metadata.clustering_order(&table, "c_ck2").unwrap(),
        ClusteringOrder::Asc
    );

    let int_test = TableIdentifier::new(POSTGRES_NAMESPACE, "int_test");
    assert!(metadata
        .secondary_index_names(&int_test)
        .unwrap()
        .contains("index"));

    registry.close();
}

#[test]
fn test_metadata_errors() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let metadata = registry.metadata();

    let missing = TableIdentifier::new("nsx", "tblx");
    for result in [
        metadata.partition_key_names(&missing),
        metadata.clustering_key_names(&missing),
    ] {
        match result {
            Err(BridgeError::TableNotFound { namespace, table }) => {
                assert_eq!(namespace, "nsx");
                assert_eq!(table, "tblx");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
    assert!(matches!(
        metadata.secondary_index_names(&missing),
        Err(BridgeError::TableNotFound { .. })
    ));

    let table = TableIdentifier::new(POSTGRES_NAMESPACE, TEST_TABLE);
    assert!(matches!(
        metadata.clustering_order(&table, "nonexistent_column"),
        Err(BridgeError::UnknownColumn { .. })
    ));

    registry.close();
}

// =============================================================================
// Planning and options
// =============================================================================

#[test]
fn test_planned_scan() {
    let engine = loaded_engine();
    let registry = engine.registry();
    let table = TableIdentifier::new(POSTGRES_NAMESPACE, "int_test");
    let columns = registry.metadata().column_metadata(&table).unwrap();

    let conditions = vec![
        Condition::equal("pk", 1),
        Condition::new("ck", CompareOp::Gt, 1),
        Condition::equal("col", 3),
    ];
    let plan = determine_remote_conditions(&conditions, &columns);
    assert_eq!(plan.kind(), ScanKind::Partition);
    assert_eq!(plan.local, vec![conditions[2].clone()]);

    let orderings = clustering_sort(&[("ck".to_string(), ClusteringOrder::Desc)], &columns).unwrap();
    assert_eq!(orderings, vec![ScanOrdering::desc("ck")]);

    let descriptor = plan.build_descriptor(table).with_orderings(orderings);
    let rows: Vec<_> = collect_rows(registry.scan(&descriptor).unwrap())
        .into_iter()
        .filter(|row| plan.local.iter().all(|c| c.matches(row)))
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_int("ck").unwrap(), Some(3));

    let index_plan = determine_remote_conditions(&[Condition::equal("index", 2)], &columns);
    assert_eq!(index_plan.kind(), ScanKind::Index);
    let rows = collect_rows(
        registry
            .scan(&index_plan.build_descriptor(TableIdentifier::new(POSTGRES_NAMESPACE, "int_test")))
            .unwrap(),
    );
    assert_eq!(rows.len(), 1);

    registry.close();
}

#[test]
fn test_options_drive_registry() {
    let engine = loaded_engine();
    let config_path = engine.config_path().display().to_string();

    let options = ForeignTableOptions::from_layers(
        &[("config_file_path", config_path.as_str())],
        &[("namespace", POSTGRES_NAMESPACE), ("table_name", TEST_TABLE)],
    )
    .unwrap();

    let registry = ConnectionRegistry::new(MemoryConnector::new());
    registry.initialize(&options.config_file_path).unwrap();
    let rows = collect_rows(registry.scan(&build_full_scan(options.table)).unwrap());
    assert_eq!(rows.len(), 1);
    registry.close();
}
