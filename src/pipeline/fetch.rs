// src/pipeline/fetch.rs

//! Dry run: fetch and normalize statuses without touching any ledger.

use crate::error::Result;
use crate::models::{Config, FacilityStatus};
use crate::services::{HttpLiveFeed, LiveFeed, fetch_statuses};

/// Fetch statuses for the configured catalog using the HTTP feed.
///
/// Needs neither the year mapping nor ledger credentials.
pub async fn run_fetch(config: &Config) -> Result<Vec<FacilityStatus>> {
    config.validate()?;
    let feed = HttpLiveFeed::new(&config.source)?;
    Ok(fetch_with(config, &feed).await)
}

pub(crate) async fn fetch_with(config: &Config, feed: &dyn LiveFeed) -> Vec<FacilityStatus> {
    log::info!(
        "Dry run: fetching {} facilities from {}",
        config.facilities.len(),
        feed.describe()
    );
    fetch_statuses(feed, &config.facilities).await
}

/// Render statuses as an aligned text table.
pub fn format_statuses(statuses: &[FacilityStatus]) -> String {
    let id_width = statuses
        .iter()
        .map(|s| s.facility_id.len())
        .max()
        .unwrap_or(0)
        .max("FACILITY".len());

    let mut out = format!("{:<id_width$}  {:>5}  {:<12}  NAME\n", "FACILITY", "WAIT", "STATUS");
    for status in statuses {
        out.push_str(&format!(
            "{:<id_width$}  {:>5}  {:<12}  {}\n",
            status.facility_id,
            status.wait_minutes,
            status.status_code.as_str(),
            status.display_name
        ));
    }
    out
}
