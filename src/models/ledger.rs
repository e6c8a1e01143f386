//! Ledger addressing and row layout.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;

use crate::error::ResolutionError;
use crate::models::{FacilityStatus, StatusCode};

/// Tab every yearly ledger keeps its rows in.
pub const TAB_NAME: &str = "WaitLog";

/// Column names, in ledger order.
pub const HEADER: [&str; 6] = [
    "timestamp",
    "facilityId",
    "displayName",
    "waitMinutes",
    "statusCode",
    "reservationNote",
];

/// Reservation availability is checked by hand.
pub const RESERVATION_NOTE: &str = "check manually";

/// Timestamp format for the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Calendar year (4 digits) to ledger id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearMapping(BTreeMap<String, String>);

impl YearMapping {
    /// Parse the mapping from its JSON object form.
    ///
    /// `None` means the mapping was never supplied.
    pub fn from_json(raw: Option<&str>) -> Result<Self, ResolutionError> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return Err(ResolutionError::MissingMapping {
                    reason: "not supplied".to_string(),
                });
            }
        };

        let entries: BTreeMap<String, String> =
            serde_json::from_str(raw).map_err(|e| ResolutionError::MissingMapping {
                reason: format!("not a JSON object of year to ledger id: {e}"),
            })?;

        for (year, ledger_id) in &entries {
            if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ResolutionError::MissingMapping {
                    reason: format!("key '{year}' is not a 4-digit year"),
                });
            }
            if ledger_id.trim().is_empty() {
                return Err(ResolutionError::MissingMapping {
                    reason: format!("ledger id for {year} is empty"),
                });
            }
        }

        Ok(Self(entries))
    }

    pub fn get(&self, year: &str) -> Option<&str> {
        self.0.get(year).map(String::as_str)
    }

    /// Provisioned years, ascending.
    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for YearMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The ledger and tab a run appends to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerTarget {
    pub year: String,
    pub ledger_id: String,
    pub tab_name: String,
}

/// One appended ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    pub timestamp: String,
    pub facility_id: String,
    pub display_name: String,
    pub wait_minutes: u32,
    pub status_code: StatusCode,
    pub reservation_note: String,
}

impl LedgerRow {
    pub fn from_status<Tz: TimeZone>(status: &FacilityStatus, at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            facility_id: status.facility_id.clone(),
            display_name: status.display_name.clone(),
            wait_minutes: status.wait_minutes,
            status_code: status.status_code,
            reservation_note: RESERVATION_NOTE.to_string(),
        }
    }

    /// Cell values in `HEADER` order.
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            Value::from(self.timestamp.as_str()),
            Value::from(self.facility_id.as_str()),
            Value::from(self.display_name.as_str()),
            Value::from(self.wait_minutes),
            Value::from(self.status_code.as_str()),
            Value::from(self.reservation_note.as_str()),
        ]
    }
}

/// The header as a row of cells.
pub fn header_cells() -> Vec<Value> {
    HEADER.iter().map(|name| Value::from(*name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacilityRef;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_mapping_parses_object() {
        let mapping = YearMapping::from_json(Some(r#"{"2025":"ID1","2026":"ID2"}"#)).unwrap();
        assert_eq!(mapping.get("2025"), Some("ID1"));
        assert_eq!(mapping.years().collect::<Vec<_>>(), vec!["2025", "2026"]);
    }

    #[test]
    fn test_mapping_absent() {
        assert!(matches!(
            YearMapping::from_json(None),
            Err(ResolutionError::MissingMapping { .. })
        ));
        assert!(matches!(
            YearMapping::from_json(Some("   ")),
            Err(ResolutionError::MissingMapping { .. })
        ));
    }

    #[test]
    fn test_mapping_malformed() {
        for raw in [r#"{"2025":"ID1""#, r#"["ID1"]"#, r#"{"2025":7}"#, r#"{"25":"ID1"}"#] {
            assert!(
                matches!(
                    YearMapping::from_json(Some(raw)),
                    Err(ResolutionError::MissingMapping { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_row_cells_follow_header() {
        let facility = FacilityRef::new("ride-a", "Ride A");
        let status = FacilityStatus::new(&facility, 35, StatusCode::Operating);
        let at = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 7, 4, 13, 5, 0)
            .unwrap();

        let row = LedgerRow::from_status(&status, &at);
        let cells = row.to_cells();

        assert_eq!(cells.len(), HEADER.len());
        assert_eq!(cells[0], "2025-07-04 13:05:00");
        assert_eq!(cells[1], "ride-a");
        assert_eq!(cells[3], 35);
        assert_eq!(cells[4], "OPERATING");
        assert_eq!(cells[5], RESERVATION_NOTE);
    }
}
