//! Line-delimited JSON transport for viewers and feed producers.
//!
//! Each connection first receives a `welcome` carrying the full board, then
//! every broadcast in order. Lines it sends are decoded as
//! [`ClientMessage`]s and forwarded to the board service. A viewer that falls
//! behind the broadcast buffer is resynchronised with a fresh `welcome`
//! instead of a replay.

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::board::BoardHandle;
use crate::error::{Error, Result};
use crate::protocol::{decode_line, encode_line, ClientMessage, ServerMessage};

/// Accepts viewer connections.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    board: BoardHandle,
}

impl Server {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, board: BoardHandle) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        Ok(Self { listener, board })
    }

    /// The address actually bound (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails irrecoverably.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(addr = %self.local_addr()?, "Listening for viewers");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    let board = self.board.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, peer, board).await {
                            debug!(%peer, error = %e, "Connection ended with error");
                        }
                    });
                }
            }
        }
    }
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, message: &ServerMessage<'_>) -> Result<()> {
    writer.write_all(encode_line(message)?.as_bytes()).await?;
    Ok(())
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, board: BoardHandle) -> Result<()> {
    info!(%peer, "Viewer connected");
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let mut subscription = board.subscribe().await?;
    send(&mut writer, &ServerMessage::from(&subscription.initial)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = dispatch(&board, &line).await {
                    if e.is_service_stopped() {
                        return Err(e);
                    }
                    warn!(%peer, error = %e, "Rejected message");
                    send(&mut writer, &ServerMessage::Error { message: e.to_string() }).await?;
                }
            }
            event = subscription.events.recv() => match event {
                Ok(event) => send(&mut writer, &ServerMessage::from(&event)).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%peer, skipped, "Viewer lagged, resending full state");
                    let state = subscription.resync(&board).await?;
                    send(&mut writer, &ServerMessage::from(state)).await?;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(%peer, "Viewer disconnected");
    Ok(())
}

async fn dispatch(board: &BoardHandle, line: &str) -> Result<()> {
    match decode_line(line)? {
        ClientMessage::Edit { id, field, value } => board.edit(id, field, value).await,
        ClientMessage::ToggleStatus { id } => board.toggle_status(id).await.map(|_| ()),
        ClientMessage::Ingest { direction, flights } => board.ingest(direction, flights).await,
    }
}
