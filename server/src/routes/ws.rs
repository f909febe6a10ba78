//! WebSocket handler: bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, joins the board named by `?board=`
//! and enters a `select!` loop:
//! - Incoming client frames → decode + apply to the board snapshot
//! - Frames relayed from board peers → forward to client
//!
//! Inbound processing never touches the socket: it returns an `Outcome` and
//! the connection loop sends any reply. Fan-out to peers happens inside the
//! board service, under the board lock.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `connect` with `client_id`, then `object:sync`
//! 2. Client sends frames → apply → Outcome (relay / reply / nothing)
//! 3. Close → part board (objects stay)

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use canvas::protocol::SyncEvent;
use frames::{CodecError, Frame};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{self, Encoding, ErrorCode};
use crate::services::board::{self, Handled};
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// What the connection loop does after one inbound frame.
#[derive(Debug)]
enum Outcome {
    /// Already queued for this many peers; nothing for the sender.
    Relayed(usize),
    /// Send to the sender only.
    Reply(Frame),
    /// Nothing to send.
    Quiet,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let board = params
        .get("board")
        .map(|b| b.trim().to_owned())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| state.config.default_board.clone());

    let Some(encoding) = Encoding::from_param(params.get("encoding").map(String::as_str)) else {
        return (StatusCode::BAD_REQUEST, "encoding must be json or protobuf").into_response();
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, board, encoding))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, board: String, encoding: Encoding) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for frames relayed from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.client_queue_capacity);

    let sync = board::join_board(&state, &board, client_id, client_tx).await;
    let welcome = SyncEvent::Connected { client_id: client_id.to_string() }.to_frame();

    if send_frame(&mut socket, encoding, &welcome).await.is_ok()
        && send_frame(&mut socket, encoding, &sync.to_frame()).await.is_ok()
    {
        info!(%client_id, %board, ?encoding, "ws: client connected");
        connection_loop(&mut socket, &state, &board, client_id, encoding, &mut client_rx).await;
    }

    board::part_board(&state, &board, client_id).await;
    info!(%client_id, %board, "ws: client disconnected");
}

async fn connection_loop(
    socket: &mut WebSocket,
    state: &AppState,
    board: &str,
    client_id: Uuid,
    encoding: Encoding,
    client_rx: &mut mpsc::Receiver<Frame>,
) {
    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                let Some(decoded) = frame::decode_message(&msg) else { continue };
                match process_inbound(state, board, client_id, decoded).await {
                    Outcome::Reply(frame) => {
                        if send_frame(socket, encoding, &frame).await.is_err() {
                            break;
                        }
                    }
                    Outcome::Relayed(peers) => debug!(%client_id, peers, "ws: relayed"),
                    Outcome::Quiet => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(socket, encoding, &frame).await.is_err() {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// Handle one decoded inbound frame.
///
/// Kept apart from the socket so tests can drive frame handling directly.
async fn process_inbound(
    state: &AppState,
    board: &str,
    client_id: Uuid,
    decoded: Result<Frame, CodecError>,
) -> Outcome {
    let frame = match decoded {
        Ok(frame) => frame,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return Outcome::Reply(frame::error_frame(&e, None));
        }
    };

    debug!(%client_id, id = %frame.id, event = %frame.event, "ws: recv frame");

    match board::handle_event(state, board, client_id, &frame).await {
        Ok(Handled::Relayed { peers }) => Outcome::Relayed(peers),
        Ok(Handled::Dropped(_)) => Outcome::Quiet,
        Ok(Handled::Snapshot(sync)) => Outcome::Reply(sync.to_frame()),
        Err(e) => {
            warn!(%client_id, event = %frame.event, code = e.error_code(), error = %e, "ws: rejected frame");
            Outcome::Reply(frame::error_frame(&e, Some(&frame.event)))
        }
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_frame(socket: &mut WebSocket, encoding: Encoding, frame: &Frame) -> Result<(), ()> {
    let msg = match encoding.encode(frame) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "ws: failed to encode frame");
            return Err(());
        }
    };
    debug!(id = %frame.id, event = %frame.event, "ws: send frame");
    socket.send(msg).await.map_err(|_| ())
}
