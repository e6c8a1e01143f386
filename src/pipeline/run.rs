// src/pipeline/run.rs

//! Run orchestrator.
//!
//! One invocation walks a linear state machine:
//!
//! ```text
//! START → TARGET_RESOLVED → STATUSES_FETCHED → ROWS_WRITTEN → DONE
//!   └──────────┴──────────────────┴──────────────→ FAILED(reason)
//! ```
//!
//! Configuration and target resolution happen before the live feed is
//! called. Fetching never fails the run; writing can. Nothing is retried.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::config::{LedgerAccess, RunConfig};
use crate::error::{ConfigError, ResolutionError, WriteFailure};
use crate::models::{Config, FacilityStatus, LedgerRow, LedgerTarget};
use crate::services::{HttpLiveFeed, LiveFeed, fetch_statuses, resolve_target};
use crate::storage::{LedgerSink, LocalLedger, SheetsLedger, WriteSummary, append_ledger_rows};
use crate::utils::http;

/// States of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    TargetResolved,
    StatusesFetched,
    RowsWritten,
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Start => "START",
            RunState::TargetResolved => "TARGET_RESOLVED",
            RunState::StatusesFetched => "STATUSES_FETCHED",
            RunState::RowsWritten => "ROWS_WRITTEN",
            RunState::Done => "DONE",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run failed.
#[derive(Debug)]
pub enum FailureCause {
    Configuration(ConfigError),
    Resolution(ResolutionError),
    Write(WriteFailure),
}

impl FailureCause {
    /// Short category label for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            FailureCause::Configuration(_) => "CONFIGURATION",
            FailureCause::Resolution(ResolutionError::MissingMapping { .. }) => "MISSING_MAPPING",
            FailureCause::Resolution(ResolutionError::NoEntryForYear { .. }) => {
                "NO_ENTRY_FOR_YEAR"
            }
            FailureCause::Write(failure) => failure.category.as_str(),
        }
    }

    fn detail(&self) -> String {
        match self {
            FailureCause::Configuration(e) => e.to_string(),
            FailureCause::Resolution(e) => e.to_string(),
            FailureCause::Write(e) => e.message.clone(),
        }
    }
}

/// A run that ended in FAILED.
#[derive(Debug)]
pub struct RunFailure {
    /// State the run was in when it failed
    pub state: RunState,
    pub cause: FailureCause,
}

impl RunFailure {
    fn new(state: RunState, cause: FailureCause) -> Self {
        Self { state, cause }
    }

    /// A configuration failure, which always happens at START.
    pub fn configuration(error: ConfigError) -> Self {
        Self::new(RunState::Start, FailureCause::Configuration(error))
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run failed at {} [{}]: {}",
            self.state,
            self.cause.category(),
            self.cause.detail()
        )
    }
}

impl std::error::Error for RunFailure {}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: LedgerTarget,
    pub statuses: Vec<FacilityStatus>,
    pub write: WriteSummary,
}

impl RunSummary {
    /// Facilities recorded as UNKNOWN or SOURCE_ERROR.
    pub fn degraded(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| s.status_code.is_sentinel())
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} rows to ledger {} ({}/{})",
            self.write.rows_written, self.target.ledger_id, self.target.year, self.target.tab_name
        )
    }
}

/// The one line a finished invocation prints, and its exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Summary for stdout, exit 0
    Success(String),
    /// Diagnostic for stderr, exit 1
    Failure(String),
}

impl Report {
    pub fn exit_code(&self) -> u8 {
        match self {
            Report::Success(_) => 0,
            Report::Failure(_) => 1,
        }
    }

    pub fn line(&self) -> &str {
        match self {
            Report::Success(line) | Report::Failure(line) => line,
        }
    }
}

impl From<&Result<RunSummary, RunFailure>> for Report {
    fn from(result: &Result<RunSummary, RunFailure>) -> Self {
        match result {
            Ok(summary) => Report::Success(summary.to_string()),
            Err(failure) => Report::from(failure),
        }
    }
}

impl From<&RunFailure> for Report {
    fn from(failure: &RunFailure) -> Self {
        Report::Failure(failure.to_string())
    }
}

/// Builds the live feed and ledger sink for a run.
#[async_trait]
pub trait Backends: Send + Sync {
    /// Construct the feed. Must not touch the network.
    fn live_feed(&self, run: &RunConfig) -> Result<Box<dyn LiveFeed>, ConfigError>;

    /// Open and authenticate the ledger backend.
    async fn ledger(&self, run: &RunConfig) -> Result<Box<dyn LedgerSink>, WriteFailure>;
}

/// HTTP live feed plus whichever ledger the configuration selects.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackends;

#[async_trait]
impl Backends for DefaultBackends {
    fn live_feed(&self, run: &RunConfig) -> Result<Box<dyn LiveFeed>, ConfigError> {
        Ok(Box::new(HttpLiveFeed::new(&run.source)?))
    }

    async fn ledger(&self, run: &RunConfig) -> Result<Box<dyn LedgerSink>, WriteFailure> {
        match &run.ledger {
            LedgerAccess::Local { root_dir } => Ok(Box::new(LocalLedger::new(root_dir.clone()))),
            LedgerAccess::Sheets { credentials } => {
                let client = http::create_async_client(&run.source)
                    .map_err(|e| WriteFailure::unknown(format!("HTTP client setup: {e}")))?;
                let sheets = SheetsLedger::connect(credentials.clone(), client).await?;
                Ok(Box::new(sheets))
            }
        }
    }
}

fn advance(from: RunState, to: RunState) -> RunState {
    log::info!("Run state {} -> {}", from, to);
    to
}

/// Build the run configuration from settings and environment, then execute.
///
/// Configuration problems fail the run at START, before any backend is
/// constructed.
pub async fn run_once<F>(
    config: &Config,
    env: F,
    backends: &dyn Backends,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary, RunFailure>
where
    F: Fn(&str) -> Option<String>,
{
    let run = RunConfig::from_config(config, env).map_err(RunFailure::configuration)?;
    execute(&run, backends, now).await
}

/// Execute one run with an already-built configuration.
pub async fn execute(
    run: &RunConfig,
    backends: &dyn Backends,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary, RunFailure> {
    let mut state = RunState::Start;

    let feed = backends
        .live_feed(run)
        .map_err(|e| RunFailure::new(state, FailureCause::Configuration(e)))?;

    let target = resolve_target(&run.year_mapping, &now)
        .map_err(|e| RunFailure::new(state, FailureCause::Resolution(e)))?;
    state = advance(state, RunState::TargetResolved);
    log::info!(
        "Writing to ledger {} for {} (tab {})",
        target.ledger_id,
        target.year,
        target.tab_name
    );

    log::info!(
        "Fetching live status for {} facilities from {}",
        run.catalog.len(),
        feed.describe()
    );
    let statuses = fetch_statuses(feed.as_ref(), &run.catalog).await;
    state = advance(state, RunState::StatusesFetched);

    let rows: Vec<LedgerRow> = statuses
        .iter()
        .map(|status| LedgerRow::from_status(status, &now))
        .collect();

    let sink = backends
        .ledger(run)
        .await
        .map_err(|e| RunFailure::new(state, FailureCause::Write(e)))?;
    let write = append_ledger_rows(sink.as_ref(), &target, &rows)
        .await
        .map_err(|e| RunFailure::new(state, FailureCause::Write(e)))?;
    state = advance(state, RunState::RowsWritten);

    let summary = RunSummary {
        target,
        statuses,
        write,
    };
    advance(state, RunState::Done);
    Ok(summary)
}
