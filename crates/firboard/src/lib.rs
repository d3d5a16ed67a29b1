//! `firboard` - a shared, continuously updated board of flights crossing a
//! flight-information region.
//!
//! The [`Reconciler`] owns one canonical record per flight, merging feed
//! snapshots with operator overrides; the [`BoardService`] serializes every
//! change and broadcasts the merged board to all connected viewers.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod board;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod flight;
pub mod logging;
pub mod overrides;
pub mod protocol;
pub mod reconciler;
pub mod server;
pub mod timecode;

pub use board::{BoardEvent, BoardHandle, BoardService, BoardState, Subscription};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use flight::{
    CoordinationStatus, Direction, EditableField, FieldValue, FlightId, FlightRecord, Highlight,
    ManualField, MergedViewRecord,
};
pub use logging::init_logging;
pub use overrides::{OverrideEntry, OverrideStore};
pub use reconciler::{BoardPolicy, Reconciler};
pub use server::Server;
