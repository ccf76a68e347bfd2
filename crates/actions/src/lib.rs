//! # excelrelay-actions
//!
//! The spreadsheet operations offered by the document-processing API.
//!
//! Each operation reads typed options from a [`WorkItem`]'s parameters,
//! acquires its input document, submits a request envelope through
//! [`excelrelay_http::ExcelClient`] and turns the decoded result into an
//! [`ItemOutput`].
//!
//! ```no_run
//! use excelrelay_actions::{Operation, Runner, WorkItem};
//! use excelrelay_core::Params;
//! use excelrelay_http::{ClientConfig, ExcelClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ExcelClient::new(ClientConfig::from_env()?)?;
//! let runner = Runner::new(client)?;
//! let item = WorkItem::new(
//!     Params::new()
//!         .with("inputDataType", "url")
//!         .with("url", "https://files.example/report.xlsx")
//!         .with("headerCenter", "Quarterly report"),
//! );
//! let output = runner.execute(Operation::AddTextHeaderFooter, &item).await?;
//! println!("{}", output.to_summary());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod item;
pub mod operation;
mod ops;
pub mod output;
pub mod runner;
pub mod source;

pub use error::{ActionError, Result};
pub use item::{Attachment, ItemOutput, WorkItem};
pub use operation::Operation;
pub use output::OutputOptions;
pub use runner::Runner;
pub use source::{Downloader, InputKind, SourceDocument, SourceOptions};
