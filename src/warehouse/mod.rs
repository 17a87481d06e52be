//! Capability surface over the remote warehouse.
//!
//! Only metadata operations live here: dataset lookup, paged table
//! listing, table creation and expiration updates.
//! - `bigquery` - adapter over the BigQuery REST API
//! - `memory` - in-process warehouse for tests
//! - `listing` - page-token following listing as a single stream

pub mod bigquery;
pub mod listing;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::errors::WarehouseError;

pub use bigquery::BigQueryWarehouse;
pub use listing::list_all_tables;
pub use memory::MemoryWarehouse;

/// Identifies a table within the warehouse project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub dataset_id: String,
    /// Unqualified table name.
    pub table_id: String,
}

impl TableRef {
    pub fn new(dataset_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Nullable,
    Required,
}

impl FieldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMode::Nullable => "NULLABLE",
            FieldMode::Required => "REQUIRED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub mode: FieldMode,
}

impl FieldSpec {
    pub fn nullable_bool(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Boolean,
            mode: FieldMode::Nullable,
        }
    }
}

/// Ordered list of table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub fields: Vec<FieldSpec>,
}

impl TableSchema {
    /// The fixed placeholder schema every provisioned table gets:
    /// `hitId` and `userId`, both nullable booleans.
    pub fn hits_placeholder() -> Self {
        Self {
            fields: vec![
                FieldSpec::nullable_bool("hitId"),
                FieldSpec::nullable_bool("userId"),
            ],
        }
    }
}

/// A table to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table: TableRef,
    pub schema: TableSchema,
    pub expiration: Option<DateTime<Utc>>,
}

/// A table as the warehouse reports it after a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub table: TableRef,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub dataset_id: String,
}

/// One page of a table listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePage {
    pub tables: Vec<TableRef>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Metadata operations the batch operations need from the warehouse.
///
/// Implementations are bound to one project. Dataset ids and table ids
/// passed in are unqualified.
#[async_trait]
pub trait Warehouse: Send + Sync {
    fn project_id(&self) -> &str;

    /// Look up a dataset. `Ok(None)` means the dataset does not exist.
    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, WarehouseError>;

    /// Fetch one page of the dataset's tables. `page_token` is `None` for
    /// the first page.
    async fn list_tables_page(
        &self,
        dataset_id: &str,
        page_token: Option<String>,
    ) -> Result<TablePage, WarehouseError>;

    async fn create_table(&self, spec: TableSpec) -> Result<TableEntry, WarehouseError>;

    /// Rewrite the expiration time of an existing table.
    async fn update_expiration(
        &self,
        table: &TableRef,
        expiration: DateTime<Utc>,
    ) -> Result<TableEntry, WarehouseError>;
}
