//! Websocket session: a `Replica` attached to one relay board.
//!
//! DESIGN
//! ======
//! The replica publishes through [`WsChannel`], which only pushes frames onto
//! an unbounded queue. A writer task owns the socket's sink half, encodes each
//! queued frame as protobuf and sends it as a binary message. The read half
//! stays with the session and is polled by the command that owns it, so all
//! replica mutation happens on a single task.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use canvas::channel::{Channel, ChannelError};
use canvas::reconciler::Applied;
use canvas::replica::Replica;
use frames::Frame;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::CliError;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const GATEWAY_ERROR: &str = "gateway:error";

// =============================================================================
// CHANNEL
// =============================================================================

/// Outbound half handed to the replica.
#[derive(Debug, Clone)]
pub struct WsChannel {
    tx: mpsc::UnboundedSender<Frame>,
    connected: Arc<AtomicBool>,
}

impl WsChannel {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Frame>, connected: Arc<AtomicBool>) -> Self {
        Self { tx, connected }
    }
}

impl Channel for WsChannel {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::Unavailable);
        }
        self.tx.send(frame).map_err(|_| ChannelError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

// =============================================================================
// URL
// =============================================================================

/// Build the relay websocket URL for `board`. Accepts `ws`, `wss`, `http`
/// and `https` bases.
///
/// # Errors
///
/// Returns [`CliError::InvalidBaseUrl`] for any other scheme and
/// [`CliError::InvalidBoard`] for board names that would need escaping.
pub fn ws_url(base_url: &str, board: &str) -> Result<String, CliError> {
    if board.is_empty() || !board.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(CliError::InvalidBoard(board.to_owned()));
    }

    let base = base_url.trim_end_matches('/');
    let origin = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_owned()
    } else {
        return Err(CliError::InvalidBaseUrl(base_url.to_owned()));
    };

    Ok(format!("{origin}/api/ws?board={board}&encoding=protobuf"))
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    replica: Replica<WsChannel>,
    reader: SplitStream<WsStream>,
    writer: JoinHandle<()>,
}

impl Session {
    /// Connect and wait until the relay's greeting and initial full sync
    /// have been applied.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] if the connection fails or the sync does not
    /// arrive within `timeout`.
    pub async fn connect(base_url: &str, board: &str, timeout: Duration) -> Result<Self, CliError> {
        let url = ws_url(base_url, board)?;
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|error| CliError::WsConnect(Box::new(error)))?;
        let (sink, reader) = stream.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let writer = tokio::spawn(write_loop(sink, rx, Arc::clone(&connected)));

        let mut session = Self { replica: Replica::new(WsChannel::new(tx, connected)), reader, writer };
        session.await_initial_sync(timeout).await?;
        info!(
            %board,
            client_id = session.replica.client_id().unwrap_or("-"),
            objects = session.replica.doc().len(),
            "session: synced"
        );
        Ok(session)
    }

    async fn await_initial_sync(&mut self, timeout: Duration) -> Result<(), CliError> {
        let fut = async {
            loop {
                if let Applied::Replaced { .. } = self.next_applied().await? {
                    return Ok(());
                }
            }
        };
        tokio::time::timeout(timeout, fut).await.map_err(|_| CliError::Timeout)?
    }

    /// Read and apply the next sync frame from the relay.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::WsClosed`] when the relay hangs up and
    /// [`CliError::ServerError`] when it rejects something this client sent.
    pub async fn next_applied(&mut self) -> Result<Applied, CliError> {
        loop {
            let frame = recv_next(&mut self.reader).await?;
            if frame.event == GATEWAY_ERROR {
                return Err(server_error(&frame));
            }
            match self.replica.handle_frame(&frame) {
                Ok(applied) => return Ok(applied),
                Err(e) => debug!(event = %frame.event, error = %e, "session: skipped frame"),
            }
        }
    }

    #[must_use]
    pub fn replica(&self) -> &Replica<WsChannel> {
        &self.replica
    }

    pub fn replica_mut(&mut self) -> &mut Replica<WsChannel> {
        &mut self.replica
    }

    /// Flush everything the replica published and close the socket.
    pub async fn close(self) {
        let Self { replica, writer, .. } = self;
        drop(replica);
        if let Err(e) = writer.await {
            warn!(error = %e, "session: writer task failed");
        }
    }
}

// =============================================================================
// IO
// =============================================================================

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Frame>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = rx.recv().await {
        debug!(event = %frame.event, id = %frame.id, "session: send frame");
        if let Err(e) = sink.send(Message::Binary(frames::encode_frame(&frame).into())).await {
            warn!(error = %e, "session: send failed");
            connected.store(false, Ordering::Relaxed);
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "session: close failed");
    }
}

async fn recv_next(reader: &mut SplitStream<WsStream>) -> Result<Frame, CliError> {
    loop {
        let Some(message) = reader.next().await else {
            return Err(CliError::WsClosed);
        };
        match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
            Message::Binary(bytes) => return frames::decode_frame(&bytes).map_err(CliError::from),
            Message::Text(text) => return frames::decode_json(text.as_str()).map_err(CliError::from),
            Message::Close(_) => return Err(CliError::WsClosed),
            _ => {}
        }
    }
}

fn server_error(frame: &Frame) -> CliError {
    let field = |key: &str| frame.data.get(key).and_then(serde_json::Value::as_str).unwrap_or("").to_owned();
    CliError::ServerError { code: field("code"), message: field("message") }
}
