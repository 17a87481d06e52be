//! Credential resolution.
//!
//! Credentials come from an ordered chain of sources. Each source either
//! yields a connected warehouse handle or says it does not apply, and the
//! first one that applies wins:
//! 1. Ambient credentials (`GOOGLE_APPLICATION_CREDENTIALS`)
//! 2. An explicit service-account key file
//!
//! Key material is never logged.

use async_trait::async_trait;
use gcp_bigquery_client::yup_oauth2::ServiceAccountKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Result, TableKeeperError};
use crate::warehouse::{BigQueryWarehouse, Warehouse};

/// Environment variable naming the ambient credentials file.
pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// A place credentials can come from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Connect to the warehouse bound to `project_id`.
    ///
    /// `Ok(None)` means this source is not configured and the next one
    /// should be tried. `Err` stops the chain.
    async fn connect(&self, project_id: &str) -> Result<Option<Arc<dyn Warehouse>>>;
}

/// Application default credentials, discovered through the environment.
pub struct AmbientCredentials {
    path: Option<PathBuf>,
}

impl AmbientCredentials {
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(CREDENTIALS_ENV_VAR).map(PathBuf::from),
        }
    }

    /// Use `path` as if it had been found in the environment.
    pub fn with_path(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// The credentials file, if the environment points at a usable one.
    pub fn discover(&self) -> Option<&Path> {
        let path = self.path.as_deref()?;
        if path.is_file() {
            Some(path)
        } else {
            tracing::warn!(
                path = %path.display(),
                "{} does not point at a readable file",
                CREDENTIALS_ENV_VAR
            );
            None
        }
    }
}

#[async_trait]
impl CredentialSource for AmbientCredentials {
    fn name(&self) -> &'static str {
        "ambient"
    }

    async fn connect(&self, project_id: &str) -> Result<Option<Arc<dyn Warehouse>>> {
        tracing::info!("Init credentials from {} variable...", CREDENTIALS_ENV_VAR);
        let Some(path) = self.discover() else {
            tracing::info!("Looks like variable not set.");
            return Ok(None);
        };

        let connected = match ambient_credentials_type(path).await {
            Some(kind) if kind == "service_account" => match load_service_account_key(path).await {
                Ok(key) => BigQueryWarehouse::connect_service_account(key, project_id).await,
                Err(e) => {
                    tracing::info!(error = %e, "Ambient credentials unusable");
                    return Ok(None);
                }
            },
            Some(_) => BigQueryWarehouse::connect_application_default(project_id).await,
            None => {
                tracing::info!(
                    path = %path.display(),
                    "Ambient credentials file has no credentials type"
                );
                return Ok(None);
            }
        };

        match connected {
            Ok(warehouse) => Ok(Some(Arc::new(warehouse))),
            Err(e) => {
                tracing::info!(error = %e, "Ambient credentials unusable");
                Ok(None)
            }
        }
    }
}

/// The `type` field of a credentials document, if it is readable JSON.
async fn ambient_credentials_type(path: &Path) -> Option<String> {
    let contents = tokio::fs::read_to_string(path).await.ok()?;
    let document: serde_json::Value = serde_json::from_str(&contents).ok()?;
    document.get("type")?.as_str().map(str::to_string)
}

/// A service-account key file given explicitly by the caller.
pub struct KeyFileCredentials {
    path: Option<PathBuf>,
}

impl KeyFileCredentials {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

fn load_error(path: &Path, reason: impl Into<String>) -> TableKeeperError {
    TableKeeperError::CredentialsLoad {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Read and parse a service-account key file.
pub async fn load_service_account_key(path: &Path) -> Result<ServiceAccountKey> {
    tracing::debug!(path = %path.display(), "Loading credentials from specified file");

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| load_error(path, format!("credentials file not found: {e}")))?;
    if metadata.is_dir() {
        return Err(load_error(path, "path is a directory"));
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| load_error(path, e.to_string()))?;
    // Parse errors from serde_json carry line/column only, never content.
    let key = serde_json::from_str(&contents)
        .map_err(|e| load_error(path, format!("invalid service account key: {e}")))?;

    tracing::debug!("Successfully loaded from file.");
    Ok(key)
}

#[async_trait]
impl CredentialSource for KeyFileCredentials {
    fn name(&self) -> &'static str {
        "key-file"
    }

    async fn connect(&self, project_id: &str) -> Result<Option<Arc<dyn Warehouse>>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };

        let key = load_service_account_key(path).await?;
        let warehouse = BigQueryWarehouse::connect_service_account(key, project_id)
            .await
            .map_err(|e| load_error(path, e.to_string()))?;
        Ok(Some(Arc::new(warehouse)))
    }
}

/// Ordered list of credential sources.
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Ambient credentials first, then the explicit key file if given.
    pub fn standard(credentials_file: Option<PathBuf>) -> Self {
        let sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(AmbientCredentials::from_env()),
            Box::new(KeyFileCredentials::new(credentials_file)),
        ];
        Self::new(sources)
    }

    /// Try each source in order and return the first connection.
    pub async fn resolve(&self, project_id: &str) -> Result<Arc<dyn Warehouse>> {
        for source in &self.sources {
            if let Some(warehouse) = source.connect(project_id).await? {
                tracing::debug!(source = source.name(), "Resolved warehouse credentials");
                return Ok(warehouse);
            }
            tracing::debug!(source = source.name(), "Credential source not applicable");
        }

        tracing::error!(
            "You need to specify --credentials-file </path/to/credentials_file.json> \
             or set {} to load credentials.",
            CREDENTIALS_ENV_VAR
        );
        Err(TableKeeperError::Configuration(
            "missing credentials source".to_string(),
        ))
    }
}
