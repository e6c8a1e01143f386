// src/pipeline/validate.rs

//! Offline pre-flight check of settings, year mapping and credentials.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::config::{LedgerAccess, RunConfig};
use crate::error::{ConfigError, ResolutionError};
use crate::models::{Config, LedgerTarget};
use crate::services::resolve_target;

/// What a run started now would use.
#[derive(Debug)]
pub struct ValidationReport {
    pub facilities: usize,
    pub years: Vec<String>,
    pub backend: String,
    pub target: Result<LedgerTarget, ResolutionError>,
    /// Next calendar year has a ledger
    pub next_year_ready: bool,
}

impl ValidationReport {
    pub fn is_runnable(&self) -> bool {
        self.target.is_ok()
    }
}

/// Validate everything a run needs without making any network call.
pub fn run_validate<F>(
    config: &Config,
    env: F,
    now: DateTime<FixedOffset>,
) -> Result<ValidationReport, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let run = RunConfig::from_config(config, env)?;

    let backend = match &run.ledger {
        LedgerAccess::Sheets { credentials } => format!("sheets ({})", credentials.client_email),
        LedgerAccess::Local { root_dir } => format!("local ({})", root_dir.display()),
    };
    let target = resolve_target(&run.year_mapping, &now);
    let next_year_ready = run
        .year_mapping
        .get(&(now.year() + 1).to_string())
        .is_some();

    match &target {
        Ok(t) => log::info!("Run now would write to ledger {} ({})", t.ledger_id, t.year),
        Err(e) => log::error!("{}", e),
    }
    if !next_year_ready {
        log::warn!(
            "No ledger mapped for {} yet; runs will fail once the year turns",
            now.year() + 1
        );
    }

    Ok(ValidationReport {
        facilities: run.catalog.len(),
        years: run.year_mapping.years().map(str::to_string).collect(),
        backend,
        target,
        next_year_ready,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;
    use crate::config::tests::settings;
    use crate::models::LedgerBackend;

    fn env(mapping: &str) -> impl Fn(&str) -> Option<String> {
        let vars = HashMap::from([("WAITLOG_LEDGER_IDS".to_string(), mapping.to_string())]);
        move |key: &str| vars.get(key).cloned()
    }

    fn at(year: i32, month: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reports_target_and_next_year() {
        let config = settings(LedgerBackend::Local);
        let report = run_validate(
            &config,
            env(r#"{"2025":"ID1","2026":"ID2"}"#),
            at(2025, 12),
        )
        .unwrap();

        assert!(report.is_runnable());
        assert_eq!(report.target.unwrap().ledger_id, "ID1");
        assert!(report.next_year_ready);
        assert_eq!(report.years, vec!["2025", "2026"]);
        assert_eq!(report.facilities, 1);
        assert!(report.backend.starts_with("local"));
    }

    #[test]
    fn test_unprovisioned_year_is_reported_not_raised() {
        let config = settings(LedgerBackend::Local);
        let report = run_validate(&config, env(r#"{"2025":"ID1"}"#), at(2026, 1)).unwrap();

        assert!(!report.is_runnable());
        assert!(matches!(
            report.target,
            Err(ResolutionError::NoEntryForYear { ref year }) if year == "2026"
        ));
        assert!(!report.next_year_ready);
    }

    #[test]
    fn test_bad_mapping_is_config_error() {
        let config = settings(LedgerBackend::Local);
        assert!(run_validate(&config, env("[]"), at(2025, 1)).is_err());
    }
}
