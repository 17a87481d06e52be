//! tablekeeper: table lifecycle chores for a BigQuery dataset.
//!
//! Two batch operations, both metadata-only:
//! - provision a numbered batch of tables with a placeholder schema and a
//!   fixed time to live
//! - re-stamp the expiration time of every table whose name matches a
//!   pattern
//!
//! The async cores live in `table_operations` and take any `Warehouse`;
//! `WarehouseSession` wraps them in a blocking API.

pub mod batch;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod logging;
pub mod table_operations;
pub mod warehouse;

pub use batch::{BatchReport, BatchWarning};
pub use client::WarehouseSession;
pub use config::{ExpirationConfig, ProvisionConfig};
pub use credentials::{AmbientCredentials, CredentialChain, CredentialSource, KeyFileCredentials};
pub use errors::{
    Result, TableKeeperError, TableOperationKind, WarehouseError, WarehouseErrorKind,
};
pub use table_operations::{TableNamePattern, execute_provision, execute_update_expiring};
pub use warehouse::{
    BigQueryWarehouse, MemoryWarehouse, TableEntry, TableRef, TableSchema, TableSpec, Warehouse,
};
