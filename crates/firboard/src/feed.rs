//! Feed adapters.
//!
//! The feed producer is external. A [`FeedSource`] turns whatever it emits
//! into full snapshots for one direction; [`run_feed`] polls a source and
//! hands each new snapshot to the board. A source that goes quiet or breaks
//! leaves the last snapshot on the board; staleness shows up in the
//! highlight, not as an error.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tracing::{debug, info, trace, warn};

use crate::board::BoardHandle;
use crate::error::{Error, Result};
use crate::flight::{Direction, FlightRecord};

/// A producer of full feed snapshots for one direction.
#[async_trait]
pub trait FeedSource: Send + std::fmt::Debug {
    /// Which board this source feeds.
    fn direction(&self) -> Direction;

    /// Human-readable name for logs.
    fn name(&self) -> String;

    /// Fetch the next snapshot, or `None` if nothing new arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the source could not be read or parsed.
    async fn poll(&mut self) -> Result<Option<Vec<FlightRecord>>>;
}

/// Reads a JSON array of flight records from a file whenever the file's
/// modification time changes.
#[derive(Debug)]
pub struct JsonFileFeed {
    path: PathBuf,
    direction: Direction,
    last_modified: Option<SystemTime>,
}

impl JsonFileFeed {
    /// Watch `path` for `direction`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, direction: Direction) -> Self {
        Self {
            path: path.into(),
            direction,
            last_modified: None,
        }
    }
}

#[async_trait]
impl FeedSource for JsonFileFeed {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn name(&self) -> String {
        format!("{} feed {}", self.direction, self.path.display())
    }

    async fn poll(&mut self) -> Result<Option<Vec<FlightRecord>>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| Error::feed(&self.path, e.to_string()))?;
        let modified = metadata.modified().ok();
        if modified.is_some() && modified == self.last_modified {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::feed(&self.path, e.to_string()))?;
        let records: Vec<FlightRecord> =
            serde_json::from_slice(&bytes).map_err(|e| Error::feed(&self.path, e.to_string()))?;

        // Only remember the stamp once the contents parsed
        self.last_modified = modified;
        Ok(Some(records))
    }
}

/// Poll `source` every `interval` and ingest what it produces.
///
/// Returns when the board service stops.
pub async fn run_feed(mut source: Box<dyn FeedSource>, board: BoardHandle, interval: Duration) {
    info!(source = %source.name(), "Feed poller started");
    let direction = source.direction();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match source.poll().await {
            Ok(Some(records)) => {
                debug!(%direction, flights = records.len(), "Feed snapshot received");
                if let Err(e) = board.ingest(direction, records).await {
                    debug!(error = %e, "Board gone, stopping feed poller");
                    break;
                }
            }
            Ok(None) => trace!(%direction, "Feed unchanged"),
            Err(e) => warn!(%direction, error = %e, "Feed poll failed, keeping last snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardService;
    use crate::clock::SystemClock;
    use crate::reconciler::{BoardPolicy, Reconciler};
    use std::sync::Arc;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("firboard-feed-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_json_file_feed_reads_once_per_change() {
        let path = temp_file(
            "inbound-once.json",
            r#"[{"id":"F1","Center Estimate":"1230"},{"id":"F2"}]"#,
        );
        let mut feed = JsonFileFeed::new(&path, Direction::Inbound);

        let first = feed.poll().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].center_estimate.as_deref(), Some("1230"));

        assert!(feed.poll().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_file_feed_missing_file_is_error() {
        let mut feed = JsonFileFeed::new("/nonexistent/firboard/feed.json", Direction::Outbound);
        let err = feed.poll().await.unwrap_err();
        assert!(matches!(err, Error::Feed { .. }));
    }

    #[tokio::test]
    async fn test_json_file_feed_bad_json_is_retried() {
        let path = temp_file("outbound-bad.json", "{ not an array");
        let mut feed = JsonFileFeed::new(&path, Direction::Outbound);
        assert!(feed.poll().await.is_err());
        // Not marked as seen, so the next poll tries again
        assert!(feed.poll().await.is_err());
    }

    #[tokio::test]
    async fn test_run_feed_ingests_into_board() {
        let path = temp_file("inbound-run.json", r#"[{"id":"F1","centerEstimate":"0900"}]"#);
        let reconciler = Reconciler::new(BoardPolicy::default(), Arc::new(SystemClock));
        let (board, _task) = BoardService::spawn(reconciler, 16, Duration::from_secs(3600));
        let mut sub = board.subscribe().await.unwrap();

        let source = Box::new(JsonFileFeed::new(&path, Direction::Inbound));
        tokio::spawn(run_feed(source, board.clone(), Duration::from_millis(10)));

        loop {
            if let crate::board::BoardEvent::Snapshot { direction, flights } =
                sub.events.recv().await.unwrap()
            {
                assert_eq!(direction, Direction::Inbound);
                assert_eq!(flights[0].id.as_str(), "F1");
                break;
            }
        }
    }
}
