//! Merging feed snapshots with operator overrides.
//!
//! The [`Reconciler`] keeps the last feed snapshot for each direction and the
//! [`OverrideStore`]. Every merge starts from the feed record, lays the
//! overrides on top, derives the center-estimate highlight and sorts the
//! board by center estimate.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::flight::{
    CoordinationStatus, Direction, FieldValue, FlightId, FlightRecord, Highlight, ManualField,
    MergedViewRecord,
};
use crate::overrides::OverrideStore;
use crate::timecode::{
    compare_unknown_last, minute_difference, normalize_manual_entry, parse_clock,
};

/// Thresholds that drive highlight derivation and override retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPolicy {
    /// Feed data older than this is shown as stale.
    pub staleness_threshold: Duration,
    /// Largest pilot/center difference, in minutes, still shown as aligned.
    pub alignment_tolerance_minutes: u16,
    /// When set, overrides for flights gone this long are dropped on ingest.
    pub override_grace: Option<Duration>,
}

impl Default for BoardPolicy {
    fn default() -> Self {
        Self {
            staleness_threshold: Duration::minutes(15),
            alignment_tolerance_minutes: 3,
            override_grace: None,
        }
    }
}

/// Owner of the canonical board state.
#[derive(Debug)]
pub struct Reconciler {
    inbound: Vec<FlightRecord>,
    outbound: Vec<FlightRecord>,
    overrides: OverrideStore,
    policy: BoardPolicy,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    /// Create an empty board.
    #[must_use]
    pub fn new(policy: BoardPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inbound: Vec::new(),
            outbound: Vec::new(),
            overrides: OverrideStore::new(),
            policy,
            clock,
        }
    }

    /// The policy in force.
    #[must_use]
    pub fn policy(&self) -> &BoardPolicy {
        &self.policy
    }

    /// The override table.
    #[must_use]
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// The current instant according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn snapshot(&self, direction: Direction) -> &[FlightRecord] {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }

    fn feed_record(&self, id: &FlightId) -> Option<&FlightRecord> {
        Direction::ALL
            .iter()
            .find_map(|d| self.snapshot(*d).iter().find(|r| &r.id == id))
    }

    /// Directions whose current snapshot reports `id`.
    #[must_use]
    pub fn directions_containing(&self, id: &FlightId) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.snapshot(*d).iter().any(|r| &r.id == id))
            .collect()
    }

    /// Replace the feed snapshot for `direction` and return its merged board.
    ///
    /// The feed is authoritative for which flights exist: ids missing from
    /// `records` leave the board, while their overrides stay in the store.
    pub fn ingest(
        &mut self,
        direction: Direction,
        records: Vec<FlightRecord>,
    ) -> Vec<MergedViewRecord> {
        let now = self.clock.now();
        info!(%direction, flights = records.len(), "Ingesting feed snapshot");
        self.overrides.mark_seen(records.iter().map(|r| &r.id), now);
        match direction {
            Direction::Inbound => self.inbound = records,
            Direction::Outbound => self.outbound = records,
        }
        self.merged(direction)
    }

    /// Drop overrides for flights absent longer than the grace window.
    ///
    /// Only ids missing from both snapshots are candidates, so no board
    /// changes as a result. A no-op unless the policy sets `override_grace`.
    pub fn compact_overrides(&mut self) -> Vec<FlightId> {
        let Some(grace) = self.policy.override_grace else {
            return Vec::new();
        };
        let now = self.clock.now();
        let (inbound, outbound) = (&self.inbound, &self.outbound);
        let dropped = self.overrides.compact(now, grace, |id| {
            inbound.iter().chain(outbound.iter()).any(|r| &r.id == id)
        });
        if !dropped.is_empty() {
            info!(count = dropped.len(), "Dropped overrides for departed flights");
        }
        dropped
    }

    /// Normalize an operator entry and record it as an override.
    ///
    /// Returns the directions whose board must be re-sent. An id the feed
    /// does not currently report is still recorded, so a later ingest that
    /// reintroduces it picks the value up.
    pub fn edit_field(&mut self, id: &FlightId, field: ManualField, raw: &str) -> Vec<Direction> {
        let value = normalize_manual_entry(field, raw);
        self.apply_override(id, FieldValue::manual(field, value))
    }

    /// Record an already-normalized override value.
    pub fn apply_override(&mut self, id: &FlightId, value: FieldValue) -> Vec<Direction> {
        let now = self.clock.now();
        self.overrides.apply(id, value, now);
        let directions = self.directions_containing(id);
        if directions.is_empty() {
            debug!(flight_id = %id, "Override recorded for flight not on the board");
        }
        directions
    }

    /// Flip the coordination flag of `id`.
    ///
    /// Returns `None` when the flight is neither on the board nor in the
    /// override store; otherwise the new flag and the directions to re-send.
    pub fn toggle_status(&mut self, id: &FlightId) -> Option<(CoordinationStatus, Vec<Direction>)> {
        let baseline = self.feed_record(id).map(|r| r.status);
        if baseline.is_none() && !self.overrides.contains(id) {
            debug!(flight_id = %id, "Toggle for unknown flight ignored");
            return None;
        }
        let now = self.clock.now();
        let status = self.overrides.toggle(id, baseline.flatten(), now);
        Some((status, self.directions_containing(id)))
    }

    /// The merged, highlighted and ordered board for `direction`.
    #[must_use]
    pub fn merged(&self, direction: Direction) -> Vec<MergedViewRecord> {
        let now = self.clock.now();
        let mut board: Vec<MergedViewRecord> = self
            .snapshot(direction)
            .iter()
            .map(|record| self.merge_record(record, now))
            .collect();
        // Stable sort: ties keep feed order
        board.sort_by(|a, b| {
            compare_unknown_last(
                a.center_estimate.as_deref().and_then(parse_clock),
                b.center_estimate.as_deref().and_then(parse_clock),
            )
        });
        board
    }

    fn merge_record(&self, record: &FlightRecord, now: DateTime<Utc>) -> MergedViewRecord {
        let entry = self.overrides.get(&record.id);
        let mut merged = MergedViewRecord {
            id: record.id.clone(),
            callsign: record.callsign.clone(),
            waypoint: record.waypoint.clone(),
            center_estimate: record.center_estimate.clone(),
            pilot_estimate: entry.pilot_estimate.or_else(|| record.pilot_estimate.clone()),
            altitude: entry.altitude.or_else(|| record.altitude.clone()),
            mach: entry.mach.or_else(|| record.mach.clone()),
            status: entry.status.or(record.status).unwrap_or_default(),
            highlight: Highlight::Conflict,
            lat: record.lat,
            lon: record.lon,
            heading: record.heading,
            utc: record.utc,
        };
        merged.highlight = self.classify(&merged, now);
        merged
    }

    /// Staleness first, then pilot/center agreement. A missing or unusable
    /// pilot estimate is a conflict.
    fn classify(&self, merged: &MergedViewRecord, now: DateTime<Utc>) -> Highlight {
        if let Some(utc) = merged.utc {
            let fresh = DateTime::<Utc>::from_timestamp_millis(utc)
                .is_some_and(|at| now.signed_duration_since(at) <= self.policy.staleness_threshold);
            if !fresh {
                return Highlight::Stale;
            }
        }

        let pilot = merged
            .pilot_estimate
            .as_deref()
            .map(|p| normalize_manual_entry(ManualField::PilotEstimate, p))
            .filter(|p| p.len() == 4)
            .and_then(|p| parse_clock(&p));
        let Some(pilot) = pilot else {
            return Highlight::Conflict;
        };

        let center = merged.center_estimate.as_deref().and_then(parse_clock);
        match minute_difference(Some(pilot), center) {
            Some(diff) if diff <= self.policy.alignment_tolerance_minutes => Highlight::Aligned,
            _ => Highlight::Conflict,
        }
    }
}
