//! Error type for operation failures.

use excelrelay_core::ExcelError;
use thiserror::Error;

use crate::operation::Operation;

/// Result type for operation execution.
pub type Result<T> = std::result::Result<T, ActionError>;

/// An operation failure, prefixed with what was being attempted.
#[derive(Debug, Error)]
#[error("{} failed: {source}", .operation.failure_prefix())]
pub struct ActionError {
    pub operation: Operation,
    #[source]
    pub source: ExcelError,
}

impl ActionError {
    pub fn new(operation: Operation, source: ExcelError) -> Self {
        Self { operation, source }
    }

    /// The underlying error kind, e.g. `poll_timeout`.
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}
