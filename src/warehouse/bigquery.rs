//! BigQuery adapter.
//!
//! Talks to the BigQuery REST API through `gcp-bigquery-client`. Errors are
//! classified by the HTTP status of the response so the batch operations
//! can tell "table exists" or "not found" apart from transport problems.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use gcp_bigquery_client::Client;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::field_type::FieldType as BigQueryFieldType;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema as BigQuerySchema;
use gcp_bigquery_client::table::ListOptions;
use gcp_bigquery_client::yup_oauth2::ServiceAccountKey;

use super::{
    DatasetInfo, FieldSpec, FieldType, TableEntry, TablePage, TableRef, TableSchema, TableSpec,
    Warehouse,
};
use crate::errors::{WarehouseError, WarehouseErrorKind};

/// Tables requested per listing page.
const LIST_PAGE_SIZE: u64 = 1000;

/// Warehouse backed by a BigQuery project.
pub struct BigQueryWarehouse {
    client: Client,
    project_id: String,
}

impl BigQueryWarehouse {
    pub fn new(client: Client, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
        }
    }

    /// Connect with application default credentials.
    pub async fn connect_application_default(
        project_id: impl Into<String>,
    ) -> Result<Self, WarehouseError> {
        let client = Client::from_application_default_credentials()
            .await
            .map_err(|e| map_bq_error(e, None))?;
        Ok(Self::new(client, project_id))
    }

    /// Connect with a parsed service-account key.
    pub async fn connect_service_account(
        key: ServiceAccountKey,
        project_id: impl Into<String>,
    ) -> Result<Self, WarehouseError> {
        let client = Client::from_service_account_key(key, false)
            .await
            .map_err(|e| map_bq_error(e, None))?;
        Ok(Self::new(client, project_id))
    }
}

/// Map a client error to a `WarehouseError`.
///
/// Response errors carry the HTTP status. Transport failures are
/// `Connection`; anything else is `Other`.
pub fn map_bq_error(err: BQError, resource: Option<&str>) -> WarehouseError {
    match err {
        BQError::ResponseError { error } => {
            let kind = WarehouseErrorKind::from_status(error.error.code);
            let message = match resource {
                Some(r) => format!("{} ({})", error.error.message, r),
                None => error.error.message,
            };
            WarehouseError::new(kind, message)
        }
        BQError::RequestError(e) => {
            WarehouseError::new(WarehouseErrorKind::Connection, e.to_string())
        }
        other => WarehouseError::new(WarehouseErrorKind::Other, other.to_string()),
    }
}

fn field_to_bigquery(field: &FieldSpec) -> TableFieldSchema {
    let field_type = match field.field_type {
        FieldType::Boolean => BigQueryFieldType::Bool,
    };
    let mut schema = TableFieldSchema::new(&field.name, field_type);
    schema.mode = Some(field.mode.as_str().to_string());
    schema
}

fn schema_to_bigquery(schema: &TableSchema) -> BigQuerySchema {
    BigQuerySchema::new(schema.fields.iter().map(field_to_bigquery).collect())
}

/// BigQuery carries expiration as epoch milliseconds in a string.
fn expiration_from_millis(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = raw?.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

fn entry_from_table(table: &Table) -> TableEntry {
    TableEntry {
        table: TableRef::new(
            table.table_reference.dataset_id.clone(),
            table.table_reference.table_id.clone(),
        ),
        expiration: expiration_from_millis(table.expiration_time.as_deref()),
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, WarehouseError> {
        match self.client.dataset().get(&self.project_id, dataset_id).await {
            Ok(_) => Ok(Some(DatasetInfo {
                dataset_id: dataset_id.to_string(),
            })),
            Err(e) => {
                let err = map_bq_error(e, Some(dataset_id));
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn list_tables_page(
        &self,
        dataset_id: &str,
        page_token: Option<String>,
    ) -> Result<TablePage, WarehouseError> {
        let mut options = ListOptions::default().max_results(LIST_PAGE_SIZE);
        if let Some(token) = page_token {
            options = options.page_token(token);
        }

        let list = self
            .client
            .table()
            .list(&self.project_id, dataset_id, options)
            .await
            .map_err(|e| map_bq_error(e, Some(dataset_id)))?;

        let tables = list
            .tables
            .into_iter()
            .flatten()
            .map(|t| TableRef::new(dataset_id, t.table_reference.table_id))
            .collect();

        Ok(TablePage {
            tables,
            next_page_token: list.next_page_token,
        })
    }

    async fn create_table(&self, spec: TableSpec) -> Result<TableEntry, WarehouseError> {
        let mut table = Table::new(
            &self.project_id,
            &spec.table.dataset_id,
            &spec.table.table_id,
            schema_to_bigquery(&spec.schema),
        );
        table.expiration_time = spec.expiration.map(|t| t.timestamp_millis().to_string());

        let resource = spec.table.to_string();
        let created = self
            .client
            .table()
            .create(table)
            .await
            .map_err(|e| map_bq_error(e, Some(&resource)))?;

        Ok(entry_from_table(&created))
    }

    async fn update_expiration(
        &self,
        table: &TableRef,
        expiration: DateTime<Utc>,
    ) -> Result<TableEntry, WarehouseError> {
        let resource = table.to_string();
        let mut current = self
            .client
            .table()
            .get(&self.project_id, &table.dataset_id, &table.table_id, None)
            .await
            .map_err(|e| map_bq_error(e, Some(&resource)))?;

        current.expiration_time = Some(expiration.timestamp_millis().to_string());

        let updated = self
            .client
            .table()
            .patch(&self.project_id, &table.dataset_id, &table.table_id, current)
            .await
            .map_err(|e| map_bq_error(e, Some(&resource)))?;

        Ok(entry_from_table(&updated))
    }
}
