//! Outcome of a batch of per-table operations.

use std::fmt;

use crate::errors::TableKeeperError;

/// Non-fatal conditions noticed while running a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWarning {
    /// The dataset had no tables at all.
    EmptyDataset { dataset_id: String },
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchWarning::EmptyDataset { dataset_id } => {
                write!(f, "dataset '{dataset_id}' has no tables")
            }
        }
    }
}

/// What a batch did: items that succeeded (in the order they were
/// attempted), per-table failures, and warnings.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    /// Each entry is a `TableKeeperError::TableOperation`.
    pub failures: Vec<TableKeeperError>,
    pub warnings: Vec<BatchWarning>,
    /// Set when the batch stopped at the first failure instead of
    /// attempting the remaining tables.
    pub aborted: bool,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            aborted: false,
        }
    }
}

impl<T> BatchReport<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    /// Record a failure. Returns `true` if the batch should keep going.
    pub(crate) fn record_failure(&mut self, err: TableKeeperError, continue_on_error: bool) -> bool {
        tracing::error!("{}", err);
        self.failures.push(err);
        if !continue_on_error {
            self.aborted = true;
        }
        continue_on_error
    }

    pub(crate) fn warn(&mut self, warning: BatchWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{TableOperationKind, WarehouseError};

    fn failure() -> TableKeeperError {
        TableKeeperError::table_operation(
            "t",
            TableOperationKind::Create,
            WarehouseError::already_exists("exists"),
        )
    }

    #[test]
    fn continuing_keeps_report_unaborted() {
        let mut report = BatchReport::<u32>::default();
        assert!(report.record_failure(failure(), true));
        assert!(!report.aborted);
        assert!(!report.is_complete());
    }

    #[test]
    fn stopping_marks_report_aborted() {
        let mut report = BatchReport::<u32>::default();
        assert!(!report.record_failure(failure(), false));
        assert!(report.aborted);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn warnings_alone_keep_report_complete() {
        let mut report = BatchReport::<u32>::default();
        report.warn(BatchWarning::EmptyDataset {
            dataset_id: "d".into(),
        });
        assert!(report.is_complete());
        assert_eq!(report.warnings[0].to_string(), "dataset 'd' has no tables");
    }
}
