//! Per-item execution and batch processing.

use excelrelay_core::ExcelResult;
use excelrelay_http::ExcelClient;
use tracing::{info, warn};

use crate::error::{ActionError, Result};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::ops;
use crate::source::Downloader;

/// Executes operations against the document API.
#[derive(Clone)]
pub struct Runner {
    client: ExcelClient,
    downloader: Downloader,
}

impl Runner {
    /// Create a runner; URL inputs are downloaded with the client's initial
    /// timeout but without its headers.
    pub fn new(client: ExcelClient) -> ExcelResult<Self> {
        let downloader = Downloader::new(client.config().initial_timeout)?;
        Ok(Self { client, downloader })
    }

    pub fn client(&self) -> &ExcelClient {
        &self.client
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Run `op` on a single item.
    pub async fn execute(&self, op: Operation, item: &WorkItem) -> Result<ItemOutput> {
        info!(operation = %op, "starting operation");
        ops::dispatch(self, op, item)
            .await
            .map_err(|source| ActionError::new(op, source))
    }

    /// Run `op` on every item in order.
    ///
    /// Without `continue_on_fail` the first failure aborts the batch. With it,
    /// a failed item yields an output carrying its input JSON and the error
    /// message, and processing moves on.
    pub async fn run_batch(
        &self,
        op: Operation,
        items: &[WorkItem],
        continue_on_fail: bool,
    ) -> Result<Vec<ItemOutput>> {
        let mut outputs = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.execute(op, item).await {
                Ok(output) => outputs.push(output),
                Err(e) if continue_on_fail => {
                    warn!(operation = %op, index, error = %e, "item failed, continuing");
                    outputs.push(ItemOutput::failed(item, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outputs)
    }
}
