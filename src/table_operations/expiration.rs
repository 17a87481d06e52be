//! Pattern-scoped expiration updates.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use super::{TableNamePattern, require_dataset};
use crate::batch::{BatchReport, BatchWarning};
use crate::errors::{Result, TableKeeperError, TableOperationKind};
use crate::warehouse::{TableEntry, Warehouse, list_all_tables};

/// Set the expiration of every table in `dataset_id` whose name fully
/// matches `pattern` to `new_expiration`.
///
/// All pages of the dataset listing are walked. Non-matching tables are
/// skipped without notice. An empty dataset is a warning, not an error.
/// A missing dataset or a failed listing aborts the call; a failed update
/// is recorded and, with `continue_on_error`, the walk goes on.
pub async fn execute_update_expiring(
    warehouse: &dyn Warehouse,
    dataset_id: &str,
    pattern: &TableNamePattern,
    new_expiration: DateTime<Utc>,
    continue_on_error: bool,
) -> Result<BatchReport<TableEntry>> {
    require_dataset(warehouse, dataset_id).await?;

    let mut report = BatchReport::default();
    let mut seen = 0usize;
    let mut tables = list_all_tables(warehouse, dataset_id);

    while let Some(table) = tables.try_next().await? {
        seen += 1;
        if !pattern.matches(&table.table_id) {
            continue;
        }
        tracing::info!("Found table matched pattern: {}", table.table_id);

        match warehouse.update_expiration(&table, new_expiration).await {
            Ok(updated) => {
                tracing::info!(table = %updated.table, "Updated successfully");
                report.succeeded.push(updated);
            }
            Err(e) => {
                let err = TableKeeperError::table_operation(
                    table.table_id,
                    TableOperationKind::UpdateExpiration,
                    e,
                );
                if !report.record_failure(err, continue_on_error) {
                    break;
                }
            }
        }
    }

    if seen == 0 {
        report.warn(BatchWarning::EmptyDataset {
            dataset_id: dataset_id.to_string(),
        });
    } else if report.succeeded.is_empty() && report.failures.is_empty() {
        tracing::info!(dataset = dataset_id, pattern = %pattern, "No tables matched pattern");
    }

    Ok(report)
}
