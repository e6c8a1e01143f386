// src/lib.rs

//! waitlog: resort wait-time ledger
//!
//! Polls a live-status API once per invocation, normalizes one status per
//! tracked facility and appends the rows to that year's ledger.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
