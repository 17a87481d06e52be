//! Blocking session over a warehouse.
//!
//! `WarehouseSession` owns the resolved warehouse handle and a
//! current-thread Tokio runtime. Each method runs one batch operation to
//! completion, issuing remote calls one at a time.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

use crate::batch::BatchReport;
use crate::config::{ExpirationConfig, ProvisionConfig};
use crate::credentials::CredentialChain;
use crate::errors::Result;
use crate::table_operations::{TableNamePattern, execute_provision, execute_update_expiring};
use crate::warehouse::{TableEntry, TableRef, Warehouse};

/// Warehouse handle plus the runtime used to drive it.
///
/// Credential sources, in order of priority:
/// 1. Ambient credentials (`GOOGLE_APPLICATION_CREDENTIALS`)
/// 2. An explicit service-account key file
///
/// # Examples
///
/// ```no_run
/// use tablekeeper::{ExpirationConfig, WarehouseSession};
///
/// let session = WarehouseSession::connect("my-project", None)?;
/// let report = session.update_expiring(&ExpirationConfig::new("analytics"))?;
/// println!("updated {} tables", report.succeeded.len());
/// # Ok::<(), tablekeeper::TableKeeperError>(())
/// ```
pub struct WarehouseSession {
    warehouse: Arc<dyn Warehouse>,
    runtime: Arc<Runtime>,
}

fn build_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

impl WarehouseSession {
    /// Resolve credentials through the standard chain and connect.
    ///
    /// # Errors
    ///
    /// `Configuration` if no credential source applies, `CredentialsLoad`
    /// if the key file cannot be read or parsed.
    pub fn connect(project_id: &str, credentials_file: Option<PathBuf>) -> Result<Self> {
        Self::connect_with(project_id, &CredentialChain::standard(credentials_file))
    }

    /// Connect through a caller-assembled credential chain.
    pub fn connect_with(project_id: &str, chain: &CredentialChain) -> Result<Self> {
        let runtime = build_runtime()?;
        let warehouse = runtime.block_on(chain.resolve(project_id))?;
        tracing::debug!(project = project_id, "Warehouse session ready");
        Ok(Self {
            warehouse,
            runtime: Arc::new(runtime),
        })
    }

    /// Wrap an already connected warehouse.
    pub fn with_warehouse(warehouse: Arc<dyn Warehouse>) -> Result<Self> {
        Ok(Self {
            warehouse,
            runtime: Arc::new(build_runtime()?),
        })
    }

    pub fn project_id(&self) -> &str {
        self.warehouse.project_id()
    }

    pub fn warehouse(&self) -> &Arc<dyn Warehouse> {
        &self.warehouse
    }

    /// Create the configured batch of tables, expiring `ttl` from now.
    pub fn provision(&self, config: &ProvisionConfig) -> Result<BatchReport<TableRef>> {
        let warehouse = self.warehouse.as_ref();
        self.runtime
            .block_on(execute_provision(warehouse, config, Utc::now()))
    }

    /// Push out the expiration of matching tables to `horizon` from now.
    pub fn update_expiring(&self, config: &ExpirationConfig) -> Result<BatchReport<TableEntry>> {
        let pattern = TableNamePattern::new(&config.pattern)?;
        let new_expiration = Utc::now() + config.horizon;
        let warehouse = self.warehouse.as_ref();
        self.runtime.block_on(execute_update_expiring(
            warehouse,
            &config.dataset_id,
            &pattern,
            new_expiration,
            config.continue_on_error,
        ))
    }
}
