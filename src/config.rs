//! Run configuration for the two batch operations.
//!
//! The defaults are the values the tool has always shipped with. Every
//! field is public so the CLI (or an embedding program) can override it.

use chrono::Duration;

/// Default lifetime of a freshly provisioned table.
pub fn default_table_ttl() -> Duration {
    Duration::weeks(1)
}

/// Default pattern selecting tables whose expiration gets rewritten.
pub const DEFAULT_EXPIRATION_PATTERN: &str = "tmp.+";

/// Default distance from now of the rewritten expiration time.
pub fn default_expiration_horizon() -> Duration {
    Duration::weeks(2)
}

/// Settings for `provision`.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Dataset the tables are created in. Must already exist.
    pub dataset_id: String,
    /// Table names are `{name_prefix}{i}` for `i` in `0..count`.
    pub name_prefix: String,
    pub count: usize,
    /// Expiration of each table is creation time plus this.
    pub ttl: Duration,
    /// Keep going after a table fails to be created.
    pub continue_on_error: bool,
}

impl ProvisionConfig {
    pub fn new(dataset_id: impl Into<String>, name_prefix: impl Into<String>, count: usize) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            name_prefix: name_prefix.into(),
            count,
            ttl: default_table_ttl(),
            continue_on_error: true,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Name of the `index`-th table of the batch.
    pub fn table_name(&self, index: usize) -> String {
        format!("{}{}", self.name_prefix, index)
    }
}

/// Settings for `update_expiring`.
#[derive(Debug, Clone)]
pub struct ExpirationConfig {
    pub dataset_id: String,
    /// Regex matched against the whole unqualified table name.
    pub pattern: String,
    /// New expiration is now plus this.
    pub horizon: Duration,
    /// Keep going after a table fails to be updated.
    pub continue_on_error: bool,
}

impl ExpirationConfig {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            pattern: DEFAULT_EXPIRATION_PATTERN.to_string(),
            horizon: default_expiration_horizon(),
            continue_on_error: true,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}
