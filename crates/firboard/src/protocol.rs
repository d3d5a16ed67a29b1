//! Wire messages exchanged with viewers and feed producers.
//!
//! One JSON object per line, tagged by `"type"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{BoardEvent, BoardState};
use crate::error::{Error, Result};
use crate::flight::{Direction, FlightId, FlightRecord, ManualField, MergedViewRecord};
use crate::overrides::OverrideEntry;

/// Requests a peer may send.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Operator typed into an editable cell.
    #[serde(rename_all = "camelCase")]
    Edit {
        /// Flight being edited.
        id: FlightId,
        /// Cell being edited.
        field: ManualField,
        /// Raw keystrokes; normalized server-side.
        value: String,
    },
    /// Operator clicked the status cell.
    #[serde(rename_all = "camelCase")]
    ToggleStatus {
        /// Flight being toggled.
        id: FlightId,
    },
    /// A feed producer pushes a full snapshot.
    #[serde(rename_all = "camelCase")]
    Ingest {
        /// Which board.
        direction: Direction,
        /// Every flight currently in that direction.
        flights: Vec<FlightRecord>,
    },
}

/// Messages the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    /// Full state, on connect and after a lag.
    Welcome {
        /// Current `HHMMZ`.
        zulu: &'a str,
        /// Full override table.
        overrides: &'a BTreeMap<FlightId, OverrideEntry>,
        /// Merged inbound board.
        inbound: &'a [MergedViewRecord],
        /// Merged outbound board.
        outbound: &'a [MergedViewRecord],
    },
    /// Full board for one direction.
    Snapshot {
        /// Which board.
        direction: Direction,
        /// Ordered merged records.
        flights: &'a [MergedViewRecord],
    },
    /// Full override table.
    Overrides {
        /// Overrides by flight id.
        entries: &'a BTreeMap<FlightId, OverrideEntry>,
    },
    /// Clock tick.
    Clock {
        /// Current `HHMMZ`.
        zulu: &'a str,
    },
    /// The peer's last line was not understood.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl<'a> From<&'a BoardState> for ServerMessage<'a> {
    fn from(state: &'a BoardState) -> Self {
        Self::Welcome {
            zulu: &state.zulu,
            overrides: &state.overrides,
            inbound: &state.inbound,
            outbound: &state.outbound,
        }
    }
}

impl<'a> From<&'a BoardEvent> for ServerMessage<'a> {
    fn from(event: &'a BoardEvent) -> Self {
        match event {
            BoardEvent::Snapshot { direction, flights } => Self::Snapshot {
                direction: *direction,
                flights,
            },
            BoardEvent::Overrides(entries) => Self::Overrides { entries },
            BoardEvent::Clock { zulu } => Self::Clock { zulu },
        }
    }
}

/// Parse one line from a peer.
///
/// # Errors
///
/// Returns [`Error::Protocol`] when the line is not a known message.
pub fn decode_line(line: &str) -> Result<ClientMessage> {
    serde_json::from_str(line.trim()).map_err(|e| Error::protocol(e.to_string()))
}

/// Render a message as one newline-terminated line.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode_line(message: &ServerMessage<'_>) -> Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::{CoordinationStatus, Highlight};
    use serde_json::Value;
    use std::sync::Arc;

    fn merged(id: &str) -> MergedViewRecord {
        MergedViewRecord {
            id: FlightId::new(id),
            callsign: "AAL1".into(),
            waypoint: "ELOPO".into(),
            center_estimate: Some("1230".into()),
            pilot_estimate: None,
            altitude: Some("350".into()),
            mach: None,
            status: CoordinationStatus::Red,
            highlight: Highlight::Conflict,
            lat: Some(18.0),
            lon: Some(-66.0),
            heading: None,
            utc: None,
        }
    }

    #[test]
    fn test_decode_edit() {
        let msg = decode_line(r#"{"type":"edit","id":"F1","field":"altitude","value":"FL350"}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Edit {
                id: FlightId::new("F1"),
                field: ManualField::Altitude,
                value: "FL350".into(),
            }
        );
    }

    #[test]
    fn test_decode_toggle() {
        let msg = decode_line(r#"{"type":"toggleStatus","id":"F1"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ToggleStatus { id: FlightId::new("F1") });
    }

    #[test]
    fn test_decode_ingest() {
        let msg = decode_line(
            r#"{"type":"ingest","direction":"outbound","flights":[{"id":"F9","Center Estimate":"0830"}]}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Ingest { direction, flights } => {
                assert_eq!(direction, Direction::Outbound);
                assert_eq!(flights[0].center_estimate.as_deref(), Some("0830"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_status_edit_and_garbage() {
        assert!(decode_line(r#"{"type":"edit","id":"F1","field":"status","value":"green"}"#).is_err());
        assert!(decode_line("hello").is_err());
        assert!(decode_line(r#"{"type":"launch"}"#).is_err());
    }

    #[test]
    fn test_encode_snapshot() {
        let event = BoardEvent::Snapshot {
            direction: Direction::Inbound,
            flights: Arc::new(vec![merged("F1")]),
        };
        let line = encode_line(&ServerMessage::from(&event)).unwrap();
        assert!(line.ends_with('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "snapshot");
        assert_eq!(value["direction"], "inbound");
        assert_eq!(value["flights"][0]["centerEstimate"], "1230");
        assert_eq!(value["flights"][0]["highlight"], "conflict");
        assert_eq!(value["flights"][0]["status"], "red");
    }

    #[test]
    fn test_encode_welcome() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            FlightId::new("F1"),
            OverrideEntry {
                status: Some(CoordinationStatus::Green),
                ..OverrideEntry::default()
            },
        );
        let state = BoardState {
            zulu: "1220Z".into(),
            overrides,
            inbound: vec![merged("F1")],
            outbound: Vec::new(),
        };
        let value: Value =
            serde_json::from_str(&encode_line(&ServerMessage::from(&state)).unwrap()).unwrap();
        assert_eq!(value["type"], "welcome");
        assert_eq!(value["zulu"], "1220Z");
        assert_eq!(value["overrides"]["F1"]["status"], "green");
        assert_eq!(value["outbound"], Value::Array(Vec::new()));
    }

    #[test]
    fn test_encode_clock_and_error() {
        let event = BoardEvent::Clock { zulu: "0905Z".into() };
        let value: Value =
            serde_json::from_str(&encode_line(&ServerMessage::from(&event)).unwrap()).unwrap();
        assert_eq!(value["type"], "clock");
        assert_eq!(value["zulu"], "0905Z");

        let err = ServerMessage::Error { message: "bad".into() };
        let value: Value = serde_json::from_str(&encode_line(&err).unwrap()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "bad");
    }
}
