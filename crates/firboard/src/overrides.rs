//! Operator overrides.
//!
//! Values typed by any operator for a flight's editable fields. An override
//! outlives every feed refresh; the store never forgets an id unless
//! compaction is switched on.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flight::{CoordinationStatus, FieldValue, FlightId};

/// The overridden fields of one flight. Unset fields fall back to the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideEntry {
    /// Pilot estimate override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pilot_estimate: Option<String>,
    /// Altitude override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<String>,
    /// Mach override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mach: Option<String>,
    /// Coordination flag override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CoordinationStatus>,
}

impl OverrideEntry {
    /// Set one field.
    pub fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::PilotEstimate(v) => self.pilot_estimate = Some(v),
            FieldValue::Altitude(v) => self.altitude = Some(v),
            FieldValue::Mach(v) => self.mach = Some(v),
            FieldValue::Status(v) => self.status = Some(v),
        }
    }

}

#[derive(Debug, Clone)]
struct Tracked {
    entry: OverrideEntry,
    last_seen: DateTime<Utc>,
}

/// Per-flight override table.
#[derive(Debug, Default)]
pub struct OverrideStore {
    entries: HashMap<FlightId, Tracked>,
}

impl OverrideStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `id`. Re-applying the same value is harmless.
    pub fn apply(&mut self, id: &FlightId, value: FieldValue, now: DateTime<Utc>) {
        debug!(flight_id = %id, field = %value.field(), "Applying override");
        let tracked = self
            .entries
            .entry(id.clone())
            .or_insert_with(|| Tracked {
                entry: OverrideEntry::default(),
                last_seen: now,
            });
        tracked.entry.set(value);
        tracked.last_seen = now;
    }

    /// Flip the coordination flag and store the result as an override.
    ///
    /// `baseline` is the feed's flag for the flight, consulted only when no
    /// status override exists yet. With neither, the flag reads as red.
    pub fn toggle(
        &mut self,
        id: &FlightId,
        baseline: Option<CoordinationStatus>,
        now: DateTime<Utc>,
    ) -> CoordinationStatus {
        let current = self
            .entries
            .get(id)
            .and_then(|t| t.entry.status)
            .or(baseline)
            .unwrap_or_default();
        let next = current.toggled();
        self.apply(id, FieldValue::Status(next), now);
        next
    }

    /// All overrides for `id`; empty when there are none.
    #[must_use]
    pub fn get(&self, id: &FlightId) -> OverrideEntry {
        self.entries
            .get(id)
            .map(|t| t.entry.clone())
            .unwrap_or_default()
    }

    /// Whether any override was ever recorded for `id`.
    #[must_use]
    pub fn contains(&self, id: &FlightId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of flights with overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no overrides exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full contents, ordered by flight id, as sent to a joining viewer.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<FlightId, OverrideEntry> {
        self.entries
            .iter()
            .map(|(id, t)| (id.clone(), t.entry.clone()))
            .collect()
    }

    /// Note that the feed still reports these flights.
    pub fn mark_seen<'a>(&mut self, ids: impl IntoIterator<Item = &'a FlightId>, now: DateTime<Utc>) {
        for id in ids {
            if let Some(tracked) = self.entries.get_mut(id) {
                tracked.last_seen = now;
            }
        }
    }

    /// Drop entries not seen for longer than `grace`. Returns the dropped ids.
    ///
    /// Ids for which `on_board` holds are kept however old their stamp is:
    /// a direction whose feed went quiet still shows its last snapshot.
    pub fn compact(
        &mut self,
        now: DateTime<Utc>,
        grace: Duration,
        on_board: impl Fn(&FlightId) -> bool,
    ) -> Vec<FlightId> {
        let mut dropped = Vec::new();
        self.entries.retain(|id, tracked| {
            let keep =
                on_board(id) || now.signed_duration_since(tracked.last_seen) <= grace;
            if !keep {
                dropped.push(id.clone());
            }
            keep
        });
        dropped.sort();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::ManualField;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn id(s: &str) -> FlightId {
        FlightId::new(s)
    }

    #[test]
    fn test_get_unknown_is_empty() {
        let store = OverrideStore::new();
        assert_eq!(store.get(&id("F1")), OverrideEntry::default());
        assert!(!store.contains(&id("F1")));
    }

    #[test]
    fn test_apply_and_get() {
        let mut store = OverrideStore::new();
        store.apply(&id("F1"), FieldValue::manual(ManualField::Altitude, "350".into()), now());
        store.apply(&id("F1"), FieldValue::manual(ManualField::Mach, "82".into()), now());

        let entry = store.get(&id("F1"));
        assert_eq!(entry.altitude.as_deref(), Some("350"));
        assert_eq!(entry.mach.as_deref(), Some("82"));
        assert!(entry.pilot_estimate.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = OverrideStore::new();
        let value = FieldValue::manual(ManualField::PilotEstimate, "1231".into());
        store.apply(&id("F1"), value.clone(), now());
        let first = store.get(&id("F1"));
        store.apply(&id("F1"), value, now());
        assert_eq!(store.get(&id("F1")), first);
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = OverrideStore::new();
        store.apply(&id("F1"), FieldValue::manual(ManualField::Altitude, "350".into()), now());
        store.apply(&id("F1"), FieldValue::manual(ManualField::Altitude, "370".into()), now());
        assert_eq!(store.get(&id("F1")).altitude.as_deref(), Some("370"));
    }

    #[test]
    fn test_toggle_from_feed_baseline() {
        let mut store = OverrideStore::new();
        let first = store.toggle(&id("F1"), Some(CoordinationStatus::Red), now());
        assert_eq!(first, CoordinationStatus::Green);
        // The override now wins over the baseline
        let second = store.toggle(&id("F1"), Some(CoordinationStatus::Red), now());
        assert_eq!(second, CoordinationStatus::Red);
    }

    #[test]
    fn test_toggle_without_baseline_turns_green() {
        let mut store = OverrideStore::new();
        assert_eq!(store.toggle(&id("F9"), None, now()), CoordinationStatus::Green);
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let mut store = OverrideStore::new();
        store.apply(&id("F2"), FieldValue::Status(CoordinationStatus::Green), now());
        store.apply(&id("F1"), FieldValue::Status(CoordinationStatus::Red), now());
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec![id("F1"), id("F2")]);
    }

    #[test]
    fn test_entry_serializes_set_fields_only() {
        let mut entry = OverrideEntry::default();
        entry.set(FieldValue::manual(ManualField::PilotEstimate, "1231".into()));
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"pilotEstimate":"1231"}"#);
    }

    #[test]
    fn test_compact_drops_only_unseen() {
        let mut store = OverrideStore::new();
        store.apply(&id("OLD"), FieldValue::Status(CoordinationStatus::Green), now());
        store.apply(&id("LIVE"), FieldValue::Status(CoordinationStatus::Green), now());

        let later = now() + Duration::minutes(45);
        store.mark_seen([&id("LIVE")], later);

        let dropped = store.compact(later, Duration::minutes(30), |_| false);
        assert_eq!(dropped, vec![id("OLD")]);
        assert!(store.contains(&id("LIVE")));
        assert!(!store.contains(&id("OLD")));
    }

    #[test]
    fn test_compact_keeps_ids_still_on_board() {
        let mut store = OverrideStore::new();
        store.apply(&id("QUIET"), FieldValue::manual(ManualField::Altitude, "370".into()), now());
        store.apply(&id("OLD"), FieldValue::manual(ManualField::Altitude, "350".into()), now());

        let later = now() + Duration::minutes(45);
        let dropped = store.compact(later, Duration::minutes(30), |flight| flight == &id("QUIET"));
        assert_eq!(dropped, vec![id("OLD")]);
        assert_eq!(store.get(&id("QUIET")).altitude.as_deref(), Some("370"));
    }
}
