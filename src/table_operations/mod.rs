//! Table lifecycle operations.
//!
//! This module provides the two batch operations:
//! - `create` - Provision a numbered batch of tables with the placeholder schema
//! - `expiration` - Re-stamp the expiration of tables whose names match a pattern
//! - `pattern` - Full-match table name patterns

mod create;
mod expiration;
mod pattern;

use crate::errors::{Result, TableKeeperError};
use crate::warehouse::{DatasetInfo, Warehouse};

// Re-export public functions
pub use create::execute_provision;
pub use expiration::execute_update_expiring;
pub use pattern::TableNamePattern;

/// Fetch the dataset or fail the whole run.
async fn require_dataset(warehouse: &dyn Warehouse, dataset_id: &str) -> Result<DatasetInfo> {
    match warehouse.get_dataset(dataset_id).await? {
        Some(dataset) => Ok(dataset),
        None => {
            tracing::error!(dataset = dataset_id, "Specified dataset not found");
            Err(TableKeeperError::DatasetNotFound(dataset_id.to_string()))
        }
    }
}
