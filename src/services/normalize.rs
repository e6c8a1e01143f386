// src/services/normalize.rs

//! Upstream payload shapes and their normalization.
//!
//! The live-data API has changed both its envelope and its entry layout
//! across revisions. Every known form is modeled here and reduced to a
//! `(wait_minutes, StatusCode)` pair without touching the network.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{FacilityRef, FacilityStatus, StatusCode};

/// Top-level body of a live-data response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LivePayload {
    /// `{"liveData": [...]}`, or `{"entities": [...]}` in older revisions
    Scoped {
        #[serde(rename = "liveData", alias = "entities")]
        live_data: Vec<Value>,
    },
    /// A bare list of entries
    Bare(Vec<Value>),
}

impl LivePayload {
    fn raw_entries(&self) -> &[Value] {
        match self {
            LivePayload::Scoped { live_data } => live_data,
            LivePayload::Bare(entries) => entries,
        }
    }

    /// Index entries by entity id.
    ///
    /// Entries that do not carry an id are skipped. If an id repeats, the
    /// last entry wins.
    pub fn index(&self) -> LiveIndex {
        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for raw in self.raw_entries() {
            let entry = match LiveEntry::deserialize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    skipped += 1;
                    log::debug!("Skipping unreadable live entry: {}", e);
                    continue;
                }
            };
            match entry.key().map(str::to_string) {
                Some(key) => {
                    entries.insert(key, entry);
                }
                None => {
                    skipped += 1;
                    log::debug!("Skipping live entry without an id");
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} live-data entries without a usable id", skipped);
        }
        LiveIndex { entries }
    }
}

/// One entity's live data.
///
/// Every field is read leniently: a value of an unexpected type is treated
/// as absent instead of discarding the whole entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LiveEntry {
    #[serde(rename = "entityId", default, deserialize_with = "lenient::id")]
    pub entity_id: Option<String>,

    /// Older revisions carry the id here, sometimes as a number
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient::queue")]
    pub queue: Option<QueueSet>,
}

impl LiveEntry {
    /// `entityId` if present, else `id`.
    pub fn key(&self) -> Option<&str> {
        self.entity_id.as_deref().or(self.id.as_deref())
    }
}

/// Queues reported for an entity, keyed by queue type upstream.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct QueueSet {
    #[serde(rename = "STANDBY", default, deserialize_with = "lenient::standby")]
    pub standby: Option<StandbyQueue>,
}

/// The walk-up queue.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StandbyQueue {
    #[serde(rename = "waitTime", default, deserialize_with = "lenient::minutes")]
    pub wait_time: Option<f64>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
}

/// Field readers that map unusable values to `None`.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{QueueSet, StandbyQueue};

    /// Non-empty string, or a number rendered as text.
    pub fn id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// A number, or a string holding one.
    pub fn minutes<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn queue<'de, D: Deserializer<'de>>(de: D) -> Result<Option<QueueSet>, D::Error> {
        Ok(QueueSet::deserialize(Value::deserialize(de)?).ok())
    }

    pub fn standby<'de, D: Deserializer<'de>>(de: D) -> Result<Option<StandbyQueue>, D::Error> {
        Ok(StandbyQueue::deserialize(Value::deserialize(de)?).ok())
    }
}

/// The forms an entry's status can take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryShape<'a> {
    /// Nested standby queue record
    Standby {
        wait_time: Option<f64>,
        status: Option<&'a str>,
    },
    /// Only a top-level status
    StatusOnly(&'a str),
    /// Neither
    Empty,
}

impl LiveEntry {
    pub fn shape(&self) -> EntryShape<'_> {
        if let Some(standby) = self.queue.as_ref().and_then(|q| q.standby.as_ref()) {
            return EntryShape::Standby {
                wait_time: standby.wait_time,
                status: standby.status.as_deref(),
            };
        }
        match self.status.as_deref() {
            Some(status) => EntryShape::StatusOnly(status),
            None => EntryShape::Empty,
        }
    }
}

/// Reduce an entry shape to wait minutes and status.
pub fn normalize(shape: EntryShape<'_>) -> (u32, StatusCode) {
    match shape {
        EntryShape::Standby { wait_time, status } => (
            clamp_wait(wait_time),
            status.map_or(StatusCode::Operating, StatusCode::from_upstream),
        ),
        EntryShape::StatusOnly(status) => (0, StatusCode::from_upstream(status)),
        EntryShape::Empty => (0, StatusCode::Unknown),
    }
}

/// Missing, negative or non-finite waits count as zero.
fn clamp_wait(wait_time: Option<f64>) -> u32 {
    match wait_time {
        Some(w) if w.is_finite() && w > 0.0 => w.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Live entries of one response, keyed by entity id.
#[derive(Debug, Clone, Default)]
pub struct LiveIndex {
    entries: HashMap<String, LiveEntry>,
}

impl LiveIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find a facility's entry by its primary id, then its aliases.
    pub fn lookup(&self, facility: &FacilityRef) -> Option<&LiveEntry> {
        facility.lookup_ids().find_map(|id| self.entries.get(id))
    }

    /// Status for one catalog entry. Absent facilities are `Unknown`.
    pub fn status_for(&self, facility: &FacilityRef) -> FacilityStatus {
        match self.lookup(facility) {
            Some(entry) => {
                let (wait, status) = normalize(entry.shape());
                FacilityStatus::new(facility, wait, status)
            }
            None => FacilityStatus::unknown(facility),
        }
    }
}
