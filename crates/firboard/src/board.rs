//! Distribution of the merged board to every connected viewer.
//!
//! All mutation goes through one task, the [`BoardService`], which owns the
//! [`Reconciler`]. Feed adapters and viewer sessions talk to it through a
//! cloneable [`BoardHandle`]; results fan out on a tokio broadcast channel.
//! Because one task applies commands in arrival order and publishes as it
//! goes, broadcasts for a direction can never overtake each other, and a
//! toggle's read-modify-write cannot interleave with another edit.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::clock::zulu;
use crate::error::{Error, Result};
use crate::flight::{
    CoordinationStatus, Direction, FlightId, FlightRecord, ManualField, MergedViewRecord,
};
use crate::overrides::OverrideEntry;
use crate::reconciler::Reconciler;

/// Depth of the command queue in front of the service task.
const COMMAND_QUEUE_DEPTH: usize = 256;

/// Something every viewer needs to hear about.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// The full merged board for one direction.
    Snapshot {
        /// Which board.
        direction: Direction,
        /// Ordered merged records.
        flights: Arc<Vec<MergedViewRecord>>,
    },
    /// The full override table.
    Overrides(Arc<BTreeMap<FlightId, OverrideEntry>>),
    /// Clock tick.
    Clock {
        /// `HHMMZ`.
        zulu: String,
    },
}

impl BoardEvent {
    /// Short name for logs.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::Overrides(_) => "overrides",
            Self::Clock { .. } => "clock",
        }
    }
}

/// Everything a viewer needs to draw the board from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    /// Current `HHMMZ`.
    pub zulu: String,
    /// Full override table.
    pub overrides: BTreeMap<FlightId, OverrideEntry>,
    /// Merged inbound board.
    pub inbound: Vec<MergedViewRecord>,
    /// Merged outbound board.
    pub outbound: Vec<MergedViewRecord>,
}

impl BoardState {
    /// The board for one direction.
    #[must_use]
    pub fn board(&self, direction: Direction) -> &[MergedViewRecord] {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }
}

/// A viewer's subscription: the state at the moment of joining plus every
/// event published after it.
#[derive(Debug)]
pub struct Subscription {
    /// State as of subscription.
    pub initial: BoardState,
    /// Events after `initial`.
    pub events: broadcast::Receiver<BoardEvent>,
}

impl Subscription {
    /// Start over from the current state after the receiver lagged.
    ///
    /// Whatever the old receiver still buffers predates the returned state
    /// and is discarded with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service task has exited.
    pub async fn resync(&mut self, board: &BoardHandle) -> Result<&BoardState> {
        *self = board.subscribe().await?;
        Ok(&self.initial)
    }
}

#[derive(Debug)]
enum Command {
    Ingest {
        direction: Direction,
        flights: Vec<FlightRecord>,
        done: oneshot::Sender<()>,
    },
    Edit {
        id: FlightId,
        field: ManualField,
        raw: String,
        done: oneshot::Sender<()>,
    },
    Toggle {
        id: FlightId,
        done: oneshot::Sender<Option<CoordinationStatus>>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
}

/// Cloneable front door to the board service.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<Command>,
}

impl BoardHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ServiceStopped)
    }

    /// Replace one direction's feed snapshot. Resolves once the new board
    /// has been broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service task has exited.
    pub async fn ingest(&self, direction: Direction, flights: Vec<FlightRecord>) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Ingest {
            direction,
            flights,
            done,
        })
        .await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Apply an operator's raw entry for a field. Resolves once broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service task has exited.
    pub async fn edit(&self, id: FlightId, field: ManualField, raw: String) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Edit {
            id,
            field,
            raw,
            done,
        })
        .await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Flip a flight's coordination flag. `None` means the flight is
    /// unknown and nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service task has exited.
    pub async fn toggle_status(&self, id: FlightId) -> Result<Option<CoordinationStatus>> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Toggle { id, done }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Join as a viewer.
    ///
    /// The initial state and the receiver are taken together inside the
    /// service, so nothing is missed or seen twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] if the service task has exited.
    pub async fn subscribe(&self) -> Result<Subscription> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

}

/// The single writer of board state.
#[derive(Debug)]
pub struct BoardService {
    reconciler: Reconciler,
    events: broadcast::Sender<BoardEvent>,
    commands: mpsc::Receiver<Command>,
    tick: Duration,
    last_sent: [Option<Arc<Vec<MergedViewRecord>>>; 2],
}

impl BoardService {
    /// Build the service and its handle without starting it.
    #[must_use]
    pub fn new(
        reconciler: Reconciler,
        broadcast_capacity: usize,
        tick: Duration,
    ) -> (Self, BoardHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (events, _) = broadcast::channel(broadcast_capacity.max(1));
        let service = Self {
            reconciler,
            events,
            commands: rx,
            tick,
            last_sent: [None, None],
        };
        (service, BoardHandle { commands: tx })
    }

    /// Build and spawn the service on the current runtime.
    #[must_use]
    pub fn spawn(
        reconciler: Reconciler,
        broadcast_capacity: usize,
        tick: Duration,
    ) -> (BoardHandle, JoinHandle<()>) {
        let (service, handle) = Self::new(reconciler, broadcast_capacity, tick);
        (handle, tokio::spawn(service.run()))
    }

    /// Serve commands and clock ticks until every handle is dropped.
    pub async fn run(mut self) {
        info!("Board service started");
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = ticker.tick() => self.on_tick(),
            }
        }
        info!("Board service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Ingest {
                direction,
                flights,
                done,
            } => {
                let board = self.reconciler.ingest(direction, flights);
                self.publish_board(direction, board);
                if !self.reconciler.compact_overrides().is_empty() {
                    self.publish_overrides();
                }
                let _ = done.send(());
            }
            Command::Edit {
                id,
                field,
                raw,
                done,
            } => {
                let directions = self.reconciler.edit_field(&id, field, &raw);
                self.publish_overrides();
                self.publish_boards(&directions);
                let _ = done.send(());
            }
            Command::Toggle { id, done } => {
                let outcome = self.reconciler.toggle_status(&id);
                if let Some((_, directions)) = &outcome {
                    self.publish_overrides();
                    self.publish_boards(directions);
                }
                let _ = done.send(outcome.map(|(status, _)| status));
            }
            Command::Subscribe { reply } => {
                let subscription = Subscription {
                    initial: self.state(),
                    events: self.events.subscribe(),
                };
                debug!(viewers = self.events.receiver_count(), "Viewer subscribed");
                let _ = reply.send(subscription);
            }
        }
    }

    fn state(&self) -> BoardState {
        BoardState {
            zulu: zulu(self.reconciler.now()),
            overrides: self.reconciler.overrides().snapshot(),
            inbound: self.reconciler.merged(Direction::Inbound),
            outbound: self.reconciler.merged(Direction::Outbound),
        }
    }

    /// Announce the time and re-send any board whose highlights moved
    /// (typically a flight crossing the staleness threshold).
    fn on_tick(&mut self) {
        self.broadcast(BoardEvent::Clock {
            zulu: zulu(self.reconciler.now()),
        });
        for direction in Direction::ALL {
            let board = self.reconciler.merged(direction);
            let changed = self.last_sent[slot(direction)]
                .as_deref()
                .map_or(!board.is_empty(), |previous| previous != &board);
            if changed {
                trace!(%direction, "Board changed since last broadcast");
                self.publish_board(direction, board);
            }
        }
    }

    fn publish_boards(&mut self, directions: &[Direction]) {
        for direction in directions {
            let board = self.reconciler.merged(*direction);
            self.publish_board(*direction, board);
        }
    }

    fn publish_board(&mut self, direction: Direction, board: Vec<MergedViewRecord>) {
        let flights = Arc::new(board);
        self.last_sent[slot(direction)] = Some(Arc::clone(&flights));
        self.broadcast(BoardEvent::Snapshot { direction, flights });
    }

    fn publish_overrides(&self) {
        let entries = Arc::new(self.reconciler.overrides().snapshot());
        self.broadcast(BoardEvent::Overrides(entries));
    }

    fn broadcast(&self, event: BoardEvent) {
        let event_type = event.event_type();
        match self.events.send(event) {
            Ok(receivers) => trace!(event_type, receivers, "Broadcast event"),
            // No viewers connected
            Err(_) => trace!(event_type, "No receivers for event"),
        }
    }
}

const fn slot(direction: Direction) -> usize {
    match direction {
        Direction::Inbound => 0,
        Direction::Outbound => 1,
    }
}
