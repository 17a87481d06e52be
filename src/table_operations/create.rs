//! Batch table provisioning.

use chrono::{DateTime, Utc};

use super::require_dataset;
use crate::batch::BatchReport;
use crate::config::ProvisionConfig;
use crate::errors::{Result, TableKeeperError, TableOperationKind};
use crate::warehouse::{TableRef, TableSchema, TableSpec, Warehouse};

/// Create `config.count` tables named `{prefix}0 .. {prefix}{count-1}`.
///
/// Every table gets the placeholder schema and expires at `now + ttl`.
/// The dataset must exist; if it does not, nothing is created.
///
/// Tables are created one after another. A failed table is recorded in the
/// report; whether the remaining tables are still attempted depends on
/// `config.continue_on_error`. Tables created before a failure are kept.
pub async fn execute_provision(
    warehouse: &dyn Warehouse,
    config: &ProvisionConfig,
    now: DateTime<Utc>,
) -> Result<BatchReport<TableRef>> {
    require_dataset(warehouse, &config.dataset_id).await?;

    let expiration = now + config.ttl;
    let mut report = BatchReport::default();

    for i in 0..config.count {
        let table = TableRef::new(&config.dataset_id, config.table_name(i));
        tracing::info!(table = %table, "Creating table {}...", i);

        let spec = TableSpec {
            table: table.clone(),
            schema: TableSchema::hits_placeholder(),
            expiration: Some(expiration),
        };

        match warehouse.create_table(spec).await {
            Ok(created) => {
                tracing::info!("Created: {}", created.table);
                report.succeeded.push(created.table);
            }
            Err(e) => {
                let err = TableKeeperError::table_operation(
                    table.table_id,
                    TableOperationKind::Create,
                    e,
                );
                if !report.record_failure(err, config.continue_on_error) {
                    break;
                }
            }
        }
    }

    Ok(report)
}
