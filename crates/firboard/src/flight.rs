//! Flight board data model.
//!
//! The feed supplies [`FlightRecord`]s; operators edit a closed set of
//! fields; viewers only ever see [`MergedViewRecord`]s.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier assigned to a flight by the feed producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(String);

impl FlightId {
    /// Wrap a feed identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FlightId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FlightId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Traffic direction relative to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Entering the region.
    Inbound,
    /// Leaving the region.
    Outbound,
}

impl Direction {
    /// Both directions, inbound first.
    pub const ALL: [Self; 2] = [Self::Inbound, Self::Outbound];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

/// Coordination flag shown in the status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinationStatus {
    /// Coordinated.
    Green,
    /// Not coordinated. Also the reading when nothing is known.
    #[default]
    Red,
}

impl CoordinationStatus {
    /// The opposite flag.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Green => Self::Red,
            Self::Red => Self::Green,
        }
    }

    fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            _ => None,
        }
    }
}

impl fmt::Display for CoordinationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// One flight as reported by the feed.
///
/// Accepts camelCase keys as well as the display-column keys older feeds
/// emit (`"Center Estimate"`, `"Pilot Estimate"`, ...). Empty strings in
/// optional fields read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    /// Feed-assigned identifier.
    pub id: FlightId,
    /// Callsign, opaque.
    #[serde(default, alias = "Callsign", deserialize_with = "text")]
    pub callsign: String,
    /// Boundary waypoint, opaque.
    #[serde(default, alias = "Waypoint", deserialize_with = "text")]
    pub waypoint: String,
    /// Center's estimate for the waypoint.
    #[serde(
        default,
        alias = "Center Estimate",
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub center_estimate: Option<String>,
    /// Pilot's estimate for the waypoint.
    #[serde(
        default,
        alias = "Pilot Estimate",
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub pilot_estimate: Option<String>,
    /// Flight level digits.
    #[serde(
        default,
        alias = "Altitude",
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub altitude: Option<String>,
    /// Mach fraction digits.
    #[serde(
        default,
        alias = "Mach",
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mach: Option<String>,
    /// Coordination flag.
    #[serde(
        default,
        alias = "Status",
        deserialize_with = "optional_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<CoordinationStatus>,
    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Track in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Feed timestamp, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc: Option<i64>,
}

impl FlightRecord {
    /// A record carrying only an id; everything else absent.
    #[must_use]
    pub fn new(id: impl Into<FlightId>) -> Self {
        Self {
            id: id.into(),
            callsign: String::new(),
            waypoint: String::new(),
            center_estimate: None,
            pilot_estimate: None,
            altitude: None,
            mach: None,
            status: None,
            lat: None,
            lon: None,
            heading: None,
            utc: None,
        }
    }
}

/// Feed text fields sometimes arrive as bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value
        .map(TextOrNumber::into_string)
        .filter(|s| !s.trim().is_empty()))
}

fn optional_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CoordinationStatus>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(CoordinationStatus::parse_lenient))
}

/// Fields an operator may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditableField {
    /// Pilot's waypoint estimate.
    PilotEstimate,
    /// Flight level.
    Altitude,
    /// Mach number.
    Mach,
    /// Coordination flag.
    Status,
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PilotEstimate => write!(f, "pilotEstimate"),
            Self::Altitude => write!(f, "altitude"),
            Self::Mach => write!(f, "mach"),
            Self::Status => write!(f, "status"),
        }
    }
}

/// The free-text subset of [`EditableField`] viewers type into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualField {
    /// Pilot's waypoint estimate.
    PilotEstimate,
    /// Flight level.
    Altitude,
    /// Mach number.
    Mach,
}

impl From<ManualField> for EditableField {
    fn from(field: ManualField) -> Self {
        match field {
            ManualField::PilotEstimate => Self::PilotEstimate,
            ManualField::Altitude => Self::Altitude,
            ManualField::Mach => Self::Mach,
        }
    }
}

impl fmt::Display for ManualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        EditableField::from(*self).fmt(f)
    }
}

/// A value for one editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Normalized pilot estimate.
    PilotEstimate(String),
    /// Normalized altitude.
    Altitude(String),
    /// Normalized mach.
    Mach(String),
    /// Coordination flag.
    Status(CoordinationStatus),
}

impl FieldValue {
    /// Wrap an already-normalized manual entry.
    #[must_use]
    pub fn manual(field: ManualField, value: String) -> Self {
        match field {
            ManualField::PilotEstimate => Self::PilotEstimate(value),
            ManualField::Altitude => Self::Altitude(value),
            ManualField::Mach => Self::Mach(value),
        }
    }

    /// Which field this value belongs to.
    #[must_use]
    pub const fn field(&self) -> EditableField {
        match self {
            Self::PilotEstimate(_) => EditableField::PilotEstimate,
            Self::Altitude(_) => EditableField::Altitude,
            Self::Mach(_) => EditableField::Mach,
            Self::Status(_) => EditableField::Status,
        }
    }
}

/// Classification of the center-estimate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// Pilot and center agree within tolerance.
    Aligned,
    /// Disagreement, or no usable pilot estimate.
    Conflict,
    /// Feed data too old to trust.
    Stale,
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aligned => write!(f, "aligned"),
            Self::Conflict => write!(f, "conflict"),
            Self::Stale => write!(f, "stale"),
        }
    }
}

/// What viewers see for one flight: feed baseline, overrides applied,
/// highlight derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedViewRecord {
    /// Feed-assigned identifier.
    pub id: FlightId,
    /// Callsign.
    pub callsign: String,
    /// Boundary waypoint.
    pub waypoint: String,
    /// Center estimate as the feed sent it.
    pub center_estimate: Option<String>,
    /// Pilot estimate, override first.
    pub pilot_estimate: Option<String>,
    /// Altitude, override first.
    pub altitude: Option<String>,
    /// Mach, override first.
    pub mach: Option<String>,
    /// Coordination flag, override first.
    pub status: CoordinationStatus,
    /// Center-estimate cell classification.
    pub highlight: Highlight,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lon: Option<f64>,
    /// Track in degrees.
    pub heading: Option<f64>,
    /// Feed timestamp, epoch milliseconds.
    pub utc: Option<i64>,
}
