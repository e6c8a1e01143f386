//! Entry points for one invocation.
//!
//! - `run_once`: resolve the ledger, fetch statuses and append rows
//! - `run_fetch`: fetch and normalize only (dry run)
//! - `run_validate`: offline pre-flight check

pub mod fetch;
pub mod run;
pub mod validate;

pub use fetch::{format_statuses, run_fetch};
pub use run::{
    Backends, DefaultBackends, FailureCause, Report, RunFailure, RunState, RunSummary, execute,
    run_once,
};
pub use validate::{ValidationReport, run_validate};
