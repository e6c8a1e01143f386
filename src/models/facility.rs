//! Tracked facilities and their per-run status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tracked attraction or restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacilityRef {
    /// Stable catalog id, also the upstream entity id
    pub id: String,

    /// Human-readable name written to the ledger
    pub name: String,

    /// Upstream ids this facility was published under by earlier API revisions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl FacilityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Ids to try against an upstream payload, primary first.
    pub fn lookup_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Normalized operational state of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Operating,
    Closed,
    Down,
    /// Upstream answered but said nothing usable about this facility
    Unknown,
    /// Upstream was unreachable or returned garbage
    SourceError,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Operating => "OPERATING",
            StatusCode::Closed => "CLOSED",
            StatusCode::Down => "DOWN",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::SourceError => "SOURCE_ERROR",
        }
    }

    /// Map an upstream status string. Unrecognized values become `Unknown`.
    pub fn from_upstream(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OPERATING" => StatusCode::Operating,
            "CLOSED" | "REFURBISHMENT" => StatusCode::Closed,
            "DOWN" => StatusCode::Down,
            _ => StatusCode::Unknown,
        }
    }

    /// Whether this value records an acquisition failure rather than a
    /// reported state.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, StatusCode::Unknown | StatusCode::SourceError)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One facility's status for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityStatus {
    pub facility_id: String,
    pub display_name: String,
    pub wait_minutes: u32,
    pub status_code: StatusCode,
}

impl FacilityStatus {
    pub fn new(facility: &FacilityRef, wait_minutes: u32, status_code: StatusCode) -> Self {
        Self {
            facility_id: facility.id.clone(),
            display_name: facility.name.clone(),
            wait_minutes,
            status_code,
        }
    }

    /// Status recorded when upstream could not be read at all.
    pub fn source_error(facility: &FacilityRef) -> Self {
        Self::new(facility, 0, StatusCode::SourceError)
    }

    /// Status recorded when upstream omitted this facility.
    pub fn unknown(facility: &FacilityRef) -> Self {
        Self::new(facility, 0, StatusCode::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_upstream() {
        assert_eq!(StatusCode::from_upstream("OPERATING"), StatusCode::Operating);
        assert_eq!(StatusCode::from_upstream("closed"), StatusCode::Closed);
        assert_eq!(StatusCode::from_upstream("REFURBISHMENT"), StatusCode::Closed);
        assert_eq!(StatusCode::from_upstream(" Down "), StatusCode::Down);
        assert_eq!(StatusCode::from_upstream("BOARDING_GROUP"), StatusCode::Unknown);
    }

    #[test]
    fn test_lookup_ids_primary_first() {
        let mut facility = FacilityRef::new("new-id", "Ride");
        facility.aliases = vec!["old-id".into(), "older-id".into()];
        let ids: Vec<&str> = facility.lookup_ids().collect();
        assert_eq!(ids, vec!["new-id", "old-id", "older-id"]);
    }

    #[test]
    fn test_status_code_serializes_screaming() {
        let json = serde_json::to_string(&StatusCode::SourceError).unwrap();
        assert_eq!(json, "\"SOURCE_ERROR\"");
    }
}
