//! Ledger storage.
//!
//! A ledger is a spreadsheet-like store made of named tabs, each holding a
//! matrix of cells. One ledger is provisioned per calendar year; waitlog
//! only ever creates its own tab inside it and appends rows to that tab.
//!
//! ## Tab Layout
//!
//! ```text
//! WaitLog
//! ├── timestamp | facilityId | displayName | waitMinutes | statusCode | reservationNote
//! ├── 2025-07-04 13:05:00 | ... (one row per facility per run)
//! └── ...
//! ```

pub mod local;
pub mod sheets;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WriteFailure;
use crate::models::{LedgerRow, LedgerTarget, header_cells};

// Re-export for convenience
pub use local::LocalLedger;
pub use sheets::SheetsLedger;

/// Result of a ledger backend call.
pub type WriteResult<T> = std::result::Result<T, WriteFailure>;

/// Outcome of one run's write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows appended by this run
    pub rows_written: usize,
    /// Whether this run created the tab and its header
    pub tab_created: bool,
}

/// Operations a ledger backend must provide.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    /// Names of the tabs currently in the ledger.
    async fn list_tabs(&self, ledger_id: &str) -> WriteResult<Vec<String>>;

    /// Add an empty tab.
    async fn create_tab(&self, ledger_id: &str, tab: &str) -> WriteResult<()>;

    /// Write the header into the first row of an empty tab.
    async fn set_header(&self, ledger_id: &str, tab: &str, header: &[Value]) -> WriteResult<()>;

    /// First row of the tab, or `None` if the tab holds no rows.
    async fn first_row(&self, ledger_id: &str, tab: &str) -> WriteResult<Option<Vec<Value>>>;

    /// Append rows after the last used row, in order, as one operation.
    ///
    /// Returns the number of rows the backend reports as written.
    async fn append_rows(&self, ledger_id: &str, tab: &str, rows: &[Vec<Value>])
    -> WriteResult<usize>;

    /// Backend name, for logs.
    fn describe(&self) -> &'static str;
}

/// Append one run's rows to the target, creating the tab on first use.
///
/// The tab is looked up on every run and only created when absent. An
/// existing tab must start with the header; if it is still empty (an
/// earlier run created it but failed before the header landed) the header
/// is written now. Existing rows are never touched.
pub async fn append_ledger_rows(
    sink: &dyn LedgerSink,
    target: &LedgerTarget,
    rows: &[LedgerRow],
) -> WriteResult<WriteSummary> {
    let tabs = sink.list_tabs(&target.ledger_id).await?;
    let header = header_cells();

    let tab_created = !tabs.iter().any(|t| t == &target.tab_name);
    if tab_created {
        log::info!(
            "Tab '{}' missing from ledger {}; creating it with header",
            target.tab_name,
            target.ledger_id
        );
        sink.create_tab(&target.ledger_id, &target.tab_name).await?;
        sink.set_header(&target.ledger_id, &target.tab_name, &header)
            .await?;
    } else {
        match sink.first_row(&target.ledger_id, &target.tab_name).await? {
            Some(first) if first == header => {}
            Some(first) => {
                return Err(WriteFailure::unknown(format!(
                    "tab '{}' in ledger {} does not start with the header (found {:?})",
                    target.tab_name, target.ledger_id, first
                )));
            }
            None => {
                log::warn!(
                    "Tab '{}' in ledger {} is empty; writing header",
                    target.tab_name,
                    target.ledger_id
                );
                sink.set_header(&target.ledger_id, &target.tab_name, &header)
                    .await?;
            }
        }
    }

    if rows.is_empty() {
        return Ok(WriteSummary {
            rows_written: 0,
            tab_created,
        });
    }

    let cells: Vec<Vec<Value>> = rows.iter().map(LedgerRow::to_cells).collect();
    let written = sink
        .append_rows(&target.ledger_id, &target.tab_name, &cells)
        .await?;

    if written != rows.len() {
        return Err(WriteFailure::unknown(format!(
            "ledger {} reported {} rows appended, expected {}",
            target.ledger_id,
            written,
            rows.len()
        )));
    }

    log::info!(
        "Appended {} rows to {} ledger {} ({})",
        written,
        sink.describe(),
        target.ledger_id,
        target.tab_name
    );

    Ok(WriteSummary {
        rows_written: written,
        tab_created,
    })
}
