// src/models/mod.rs

//! Domain models for waitlog.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod facility;
mod ledger;

// Re-export all public types
pub use config::{Config, LedgerBackend, LedgerConfig, LoggingConfig, SourceConfig};
pub use facility::{FacilityRef, FacilityStatus, StatusCode};
pub use ledger::{
    HEADER, LedgerRow, LedgerTarget, RESERVATION_NOTE, TAB_NAME, TIMESTAMP_FORMAT, YearMapping,
    header_cells,
};
