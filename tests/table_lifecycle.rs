//! End-to-end runs of both operations through the blocking session.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tablekeeper::{
    BatchWarning, ExpirationConfig, MemoryWarehouse, ProvisionConfig, TableKeeperError,
    TableOperationKind, TableSchema, WarehouseError, WarehouseErrorKind, WarehouseSession,
};

fn session_over(warehouse: &Arc<MemoryWarehouse>) -> WarehouseSession {
    WarehouseSession::with_warehouse(warehouse.clone()).unwrap()
}

#[test]
fn provision_then_expire_round() {
    let warehouse = Arc::new(MemoryWarehouse::new("owox-test-1").with_page_size(3));
    warehouse.add_dataset("owox_dataset_1");
    let session = session_over(&warehouse);
    assert_eq!(session.project_id(), "owox-test-1");

    let before = Utc::now();
    let provisioned = session
        .provision(&ProvisionConfig::new("owox_dataset_1", "tmp", 5))
        .unwrap();
    let after = Utc::now();

    assert_eq!(provisioned.succeeded.len(), 5);
    for (i, table) in provisioned.succeeded.iter().enumerate() {
        assert_eq!(table.table_id, format!("tmp{i}"));
        assert_eq!(
            warehouse.schema_of("owox_dataset_1", &table.table_id),
            Some(TableSchema::hits_placeholder())
        );
        let expires = warehouse
            .expiration_of("owox_dataset_1", &table.table_id)
            .unwrap();
        assert!(expires >= before + Duration::weeks(1));
        assert!(expires <= after + Duration::weeks(1));
    }

    let before = Utc::now();
    let updated = session
        .update_expiring(&ExpirationConfig::new("owox_dataset_1"))
        .unwrap();
    let after = Utc::now();

    assert_eq!(updated.succeeded.len(), 5);
    for entry in &updated.succeeded {
        let expires = entry.expiration.unwrap();
        assert!(expires >= before + Duration::weeks(2));
        assert!(expires <= after + Duration::weeks(2));
        assert_eq!(
            warehouse.expiration_of("owox_dataset_1", &entry.table.table_id),
            Some(expires)
        );
    }
}

#[test]
fn analytics_scenario_updates_only_tmp_tables() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    let original = Utc::now();
    for name in ["tmp123", "tmp_abc", "prod1"] {
        warehouse.add_table("analytics", name, Some(original));
    }
    let session = session_over(&warehouse);

    let report = session
        .update_expiring(&ExpirationConfig::new("analytics"))
        .unwrap();

    let mut names: Vec<_> = report
        .succeeded
        .iter()
        .map(|e| e.table.table_id.clone())
        .collect();
    names.sort();
    assert_eq!(names, ["tmp123", "tmp_abc"]);
    assert_eq!(warehouse.expiration_of("analytics", "prod1"), Some(original));
    assert!(report.is_complete());
}

#[test]
fn custom_pattern_and_horizon() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    for name in ["scratch_1", "scratch_2", "tmp1"] {
        warehouse.add_table("analytics", name, None);
    }
    let session = session_over(&warehouse);
    let config = ExpirationConfig::new("analytics")
        .with_pattern(r"scratch_\d+")
        .with_horizon(Duration::days(1));

    let before = Utc::now();
    let report = session.update_expiring(&config).unwrap();

    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(warehouse.expiration_of("analytics", "tmp1"), None);
    let expires = report.succeeded[0].expiration.unwrap();
    assert!(expires >= before + Duration::days(1));
    assert!(expires < before + Duration::days(2));
}

#[test]
fn invalid_pattern_fails_before_any_remote_call() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    warehouse.add_table("analytics", "tmp1", None);
    let session = session_over(&warehouse);

    let err = session
        .update_expiring(&ExpirationConfig::new("analytics").with_pattern("tmp["))
        .err()
        .unwrap();

    assert!(matches!(err, TableKeeperError::InvalidPattern { .. }));
    assert_eq!(warehouse.list_calls(), 0);
}

#[test]
fn missing_dataset_fails_both_operations() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    let session = session_over(&warehouse);

    let err = session
        .provision(&ProvisionConfig::new("nowhere", "tmp", 3))
        .err()
        .unwrap();
    assert!(matches!(err, TableKeeperError::DatasetNotFound(_)));

    let err = session
        .update_expiring(&ExpirationConfig::new("nowhere"))
        .err()
        .unwrap();
    assert!(matches!(err, TableKeeperError::DatasetNotFound(_)));

    assert_eq!(warehouse.create_calls(), 0);
    assert_eq!(warehouse.update_calls(), 0);
}

#[test]
fn empty_dataset_is_a_warning() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    warehouse.add_dataset("analytics");
    let session = session_over(&warehouse);

    let report = session
        .update_expiring(&ExpirationConfig::new("analytics"))
        .unwrap();

    assert!(report.succeeded.is_empty());
    assert!(matches!(
        report.warnings.as_slice(),
        [BatchWarning::EmptyDataset { dataset_id }] if dataset_id == "analytics"
    ));
    assert!(report.is_complete());
}

#[test]
fn partial_failures_leave_earlier_tables_in_place() {
    let warehouse = Arc::new(MemoryWarehouse::new("proj"));
    warehouse.add_dataset("analytics");
    warehouse.fail_on(
        "tmp2",
        TableOperationKind::Create,
        WarehouseError::new(WarehouseErrorKind::Connection, "connection reset"),
    );
    let session = session_over(&warehouse);

    let report = session
        .provision(&ProvisionConfig::new("analytics", "tmp", 4).with_continue_on_error(false))
        .unwrap();

    assert!(report.aborted);
    assert_eq!(warehouse.table_names("analytics"), ["tmp0", "tmp1"]);
    assert_eq!(
        report.failures[0].warehouse_kind(),
        Some(WarehouseErrorKind::Connection)
    );

    let report = session
        .provision(&ProvisionConfig::new("analytics", "tmp", 4))
        .unwrap();

    // tmp0 and tmp1 exist already, tmp2 still fails, tmp3 is new.
    let created: Vec<_> = report.succeeded.iter().map(|t| t.table_id.as_str()).collect();
    assert_eq!(created, ["tmp3"]);
    assert_eq!(report.failures.len(), 3);
    assert!(!report.aborted);
}
