// src/services/statuses.rs

//! Status source adapter.
//!
//! Turns one live-data snapshot into exactly one `FacilityStatus` per catalog
//! entry, in catalog order. Upstream failures never propagate: they become
//! `SOURCE_ERROR` rows.

use crate::models::{FacilityRef, FacilityStatus};
use crate::services::live::LiveFeed;

/// Fetch and normalize statuses for every facility in `catalog`.
pub async fn fetch_statuses(feed: &dyn LiveFeed, catalog: &[FacilityRef]) -> Vec<FacilityStatus> {
    let payload = match feed.fetch_live().await {
        Ok(payload) => payload,
        Err(error) => {
            log::warn!(
                "Live data unavailable from {}: {}. Marking {} facilities as SOURCE_ERROR",
                feed.describe(),
                error,
                catalog.len()
            );
            return catalog.iter().map(FacilityStatus::source_error).collect();
        }
    };

    let index = payload.index();
    log::debug!("Live snapshot holds {} entities", index.len());

    catalog
        .iter()
        .map(|facility| {
            let status = index.status_for(facility);
            if status.status_code.is_sentinel() {
                log::warn!(
                    "No usable live data for {} ({}): {}",
                    facility.name,
                    facility.id,
                    status.status_code
                );
            }
            status
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::SourceError;
    use crate::models::StatusCode;
    use crate::services::normalize::LivePayload;

    /// Feed that serves a fixed body, or a fixed failure, and counts calls.
    pub(crate) struct FakeFeed {
        body: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeFeed {
        pub(crate) fn serving(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn down() -> Self {
            Self {
                body: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LiveFeed for FakeFeed {
        async fn fetch_live(&self) -> Result<LivePayload, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(serde_json::from_str(body)?),
                None => Err(SourceError::Status(502)),
            }
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    pub(crate) fn catalog(n: usize) -> Vec<FacilityRef> {
        (0..n)
            .map(|i| FacilityRef::new(format!("f{i}"), format!("Facility {i}")))
            .collect()
    }

    /// Three of five facilities present: two queued, one closed.
    pub(crate) const PARTIAL_BODY: &str = r#"{
        "id": "resort",
        "liveData": [
            {"id": "f3", "status": "CLOSED"},
            {"id": "f0", "status": "OPERATING", "queue": {"STANDBY": {"waitTime": 12}}},
            {"id": "f1", "status": "OPERATING", "queue": {"STANDBY": {"waitTime": 45}}},
            {"id": "unrelated", "status": "OPERATING"}
        ]
    }"#;

    #[tokio::test]
    async fn test_upstream_failure_degrades_every_facility() {
        let feed = FakeFeed::down();
        let catalog = catalog(4);

        let statuses = fetch_statuses(&feed, &catalog).await;

        assert_eq!(statuses.len(), catalog.len());
        for (status, facility) in statuses.iter().zip(&catalog) {
            assert_eq!(status.facility_id, facility.id);
            assert_eq!(status.status_code, StatusCode::SourceError);
            assert_eq!(status.wait_minutes, 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_degrades_every_facility() {
        let feed = FakeFeed::serving(r#"{"message":"maintenance"}"#);
        let statuses = fetch_statuses(&feed, &catalog(2)).await;
        assert!(
            statuses
                .iter()
                .all(|s| s.status_code == StatusCode::SourceError)
        );
    }

    #[tokio::test]
    async fn test_partial_snapshot_keeps_order_and_length() {
        let feed = FakeFeed::serving(PARTIAL_BODY);
        let catalog = catalog(5);

        let statuses = fetch_statuses(&feed, &catalog).await;
        let summary: Vec<(&str, u32, StatusCode)> = statuses
            .iter()
            .map(|s| (s.facility_id.as_str(), s.wait_minutes, s.status_code))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("f0", 12, StatusCode::Operating),
                ("f1", 45, StatusCode::Operating),
                ("f2", 0, StatusCode::Unknown),
                ("f3", 0, StatusCode::Closed),
                ("f4", 0, StatusCode::Unknown),
            ]
        );
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let feed = FakeFeed::serving(PARTIAL_BODY);
        assert!(fetch_statuses(&feed, &[]).await.is_empty());
    }
}
