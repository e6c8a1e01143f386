//! Service layer for waitlog.
//!
//! This module contains the business logic for:
//! - Live-data acquisition (`LiveFeed`, `HttpLiveFeed`)
//! - Payload normalization (`LivePayload`, `LiveIndex`)
//! - Status adaptation (`fetch_statuses`)
//! - Ledger target resolution (`resolve_target`)

mod live;
pub mod normalize;
mod resolver;
mod statuses;

pub use live::{HttpLiveFeed, LiveFeed};
pub use normalize::{LiveIndex, LivePayload};
pub use resolver::resolve_target;
pub use statuses::fetch_statuses;

#[cfg(test)]
pub(crate) use statuses::tests as fakes;
