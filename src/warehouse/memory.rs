//! In-process warehouse.
//!
//! Behaves like the remote service for the operations this crate uses:
//! creating an existing table fails with `AlreadyExists`, operations on a
//! missing dataset or table fail with `NotFound`, and listings are paged
//! in table-name order. Individual tables can be set up to fail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{DatasetInfo, TableEntry, TablePage, TableRef, TableSchema, TableSpec, Warehouse};
use crate::errors::{TableOperationKind, WarehouseError, WarehouseErrorKind};

/// Page size used when none is configured (same as the BigQuery default).
const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
struct StoredTable {
    schema: Option<TableSchema>,
    expiration: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    datasets: BTreeMap<String, BTreeMap<String, StoredTable>>,
    failures: HashMap<(String, TableOperationKind), WarehouseError>,
}

pub struct MemoryWarehouse {
    project_id: String,
    page_size: usize,
    state: Mutex<State>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryWarehouse {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(State::default()),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the warehouse from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_dataset(&self, dataset_id: &str) {
        self.state()
            .datasets
            .entry(dataset_id.to_string())
            .or_default();
    }

    /// Seed a table without going through `create_table`. Creates the
    /// dataset if needed.
    pub fn add_table(&self, dataset_id: &str, table_id: &str, expiration: Option<DateTime<Utc>>) {
        self.state()
            .datasets
            .entry(dataset_id.to_string())
            .or_default()
            .insert(
                table_id.to_string(),
                StoredTable {
                    schema: None,
                    expiration,
                },
            );
    }

    /// Make every `operation` on `table_id` fail with `error`.
    pub fn fail_on(&self, table_id: &str, operation: TableOperationKind, error: WarehouseError) {
        self.state()
            .failures
            .insert((table_id.to_string(), operation), error);
    }

    pub fn table_names(&self, dataset_id: &str) -> Vec<String> {
        self.state()
            .datasets
            .get(dataset_id)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn expiration_of(&self, dataset_id: &str, table_id: &str) -> Option<DateTime<Utc>> {
        self.state()
            .datasets
            .get(dataset_id)
            .and_then(|tables| tables.get(table_id))
            .and_then(|t| t.expiration)
    }

    /// Schema a table was created with; `None` for seeded tables.
    pub fn schema_of(&self, dataset_id: &str, table_id: &str) -> Option<TableSchema> {
        self.state()
            .datasets
            .get(dataset_id)
            .and_then(|tables| tables.get(table_id))
            .and_then(|t| t.schema.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }

    fn injected_failure(
        state: &State,
        table_id: &str,
        operation: TableOperationKind,
    ) -> Option<WarehouseError> {
        state
            .failures
            .get(&(table_id.to_string(), operation))
            .cloned()
    }
}

fn dataset_missing(dataset_id: &str) -> WarehouseError {
    WarehouseError::not_found(format!("Not found: Dataset {dataset_id}"))
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, WarehouseError> {
        let found = self.state().datasets.contains_key(dataset_id);
        Ok(found.then(|| DatasetInfo {
            dataset_id: dataset_id.to_string(),
        }))
    }

    async fn list_tables_page(
        &self,
        dataset_id: &str,
        page_token: Option<String>,
    ) -> Result<TablePage, WarehouseError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        let offset = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                WarehouseError::new(
                    WarehouseErrorKind::InvalidRequest,
                    format!("Invalid page token: {token}"),
                )
            })?,
            None => 0,
        };

        let state = self.state();
        let tables = state
            .datasets
            .get(dataset_id)
            .ok_or_else(|| dataset_missing(dataset_id))?;

        let page: Vec<TableRef> = tables
            .keys()
            .skip(offset)
            .take(self.page_size)
            .map(|name| TableRef::new(dataset_id, name.clone()))
            .collect();
        let end = offset + page.len();
        let next_page_token = (end < tables.len()).then(|| end.to_string());

        Ok(TablePage {
            tables: page,
            next_page_token,
        })
    }

    async fn create_table(&self, spec: TableSpec) -> Result<TableEntry, WarehouseError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state();
        if let Some(err) =
            Self::injected_failure(&state, &spec.table.table_id, TableOperationKind::Create)
        {
            return Err(err);
        }

        let tables = state
            .datasets
            .get_mut(&spec.table.dataset_id)
            .ok_or_else(|| dataset_missing(&spec.table.dataset_id))?;

        if tables.contains_key(&spec.table.table_id) {
            return Err(WarehouseError::already_exists(format!(
                "Already Exists: Table {}:{}",
                self.project_id, spec.table
            )));
        }

        tables.insert(
            spec.table.table_id.clone(),
            StoredTable {
                schema: Some(spec.schema),
                expiration: spec.expiration,
            },
        );

        Ok(TableEntry {
            table: spec.table,
            expiration: spec.expiration,
        })
    }

    async fn update_expiration(
        &self,
        table: &TableRef,
        expiration: DateTime<Utc>,
    ) -> Result<TableEntry, WarehouseError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state();
        if let Some(err) =
            Self::injected_failure(&state, &table.table_id, TableOperationKind::UpdateExpiration)
        {
            return Err(err);
        }

        let stored = state
            .datasets
            .get_mut(&table.dataset_id)
            .ok_or_else(|| dataset_missing(&table.dataset_id))?
            .get_mut(&table.table_id)
            .ok_or_else(|| WarehouseError::not_found(format!("Not found: Table {table}")))?;

        stored.expiration = Some(expiration);

        Ok(TableEntry {
            table: table.clone(),
            expiration: Some(expiration),
        })
    }
}
