// src/services/resolver.rs

//! Ledger target resolution.

use chrono::Datelike;

use crate::error::ResolutionError;
use crate::models::{LedgerTarget, TAB_NAME, YearMapping};

/// Pick the ledger for the calendar year of `now`.
pub fn resolve_target(
    mapping: &YearMapping,
    now: &impl Datelike,
) -> Result<LedgerTarget, ResolutionError> {
    let year = format!("{:04}", now.year());

    let ledger_id = mapping
        .get(&year)
        .ok_or_else(|| ResolutionError::NoEntryForYear { year: year.clone() })?;

    Ok(LedgerTarget {
        year,
        ledger_id: ledger_id.to_string(),
        tab_name: TAB_NAME.to_string(),
    })
}
