//! Board service: join/part, snapshot upkeep and fan-out.
//!
//! DESIGN
//! ======
//! The relay keeps one authoritative `DocStore` per board so a joining
//! client can be handed a full sync. Inbound events are applied to that
//! store with the same rules a replica uses (duplicate adds and references
//! to unknown objects are ignored, modifications replace every attribute)
//! and only events that changed the store are relayed to peers. Validation
//! happens before any mutation, so a rejected event leaves the board as it
//! was.
//!
//! ERROR HANDLING
//! ==============
//! Rejections are typed (`BoardError`) and mapped to `E_*` codes through
//! [`ErrorCode`]; the websocket layer turns them into `gateway:error` frames
//! for the offending client only.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use canvas::doc::DocStore;
use canvas::protocol::{ProtocolError, SyncEvent};
use canvas::reconciler::Ignored;
use canvas::snapshot;
use canvas::wire::{self, ObjectError};
use frames::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::state::{AppState, BoardState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    MalformedObject(#[from] ObjectError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("{0} is only sent by the relay")]
    UnexpectedEvent(&'static str),
}

impl ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedObject(_) => "E_MALFORMED_OBJECT",
            Self::Protocol(ProtocolError::UnknownEvent(_)) => "E_UNKNOWN_EVENT",
            Self::Protocol(ProtocolError::InvalidPayload { .. }) => "E_INVALID_PAYLOAD",
            Self::UnexpectedEvent(_) => "E_UNEXPECTED_EVENT",
        }
    }
}

/// What the relay does with an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The store changed; forward the event to peers.
    Relay,
    /// Valid but a no-op for this board; nobody hears about it.
    Drop(Ignored),
    /// The sender asked for a full sync.
    Snapshot,
}

// =============================================================================
// SNAPSHOT RULES
// =============================================================================

/// Apply one client event to a board's store.
///
/// # Errors
///
/// Returns [`BoardError::MalformedObject`] when an added or modified object
/// cannot be deserialized, and [`BoardError::UnexpectedEvent`] for events
/// only the relay may originate.
pub fn apply_event(objects: &mut DocStore, event: &SyncEvent) -> Result<Disposition, BoardError> {
    match event {
        SyncEvent::Added(payload) => {
            let obj = wire::deserialize(payload)?;
            let id = obj.id.clone().unwrap_or_default();
            if objects.contains_id(&id) {
                return Ok(Disposition::Drop(Ignored::DuplicateAdd(id)));
            }
            objects.insert(obj);
            Ok(Disposition::Relay)
        }
        SyncEvent::Modified(payload) => {
            let incoming = wire::deserialize(payload)?;
            let id = incoming.id.clone().unwrap_or_default();
            let Some(key) = objects.find(&id) else {
                return Ok(Disposition::Drop(Ignored::UnknownObjectReference(id)));
            };
            objects.modify(key, |obj| obj.replace_attributes(incoming));
            Ok(Disposition::Relay)
        }
        SyncEvent::Removed(payload) => {
            let id = wire::wire_id(payload).unwrap_or_default();
            if objects.remove_id(id).is_none() {
                return Ok(Disposition::Drop(Ignored::UnknownObjectReference(id.to_owned())));
            }
            Ok(Disposition::Relay)
        }
        SyncEvent::ClearAll => {
            objects.clear();
            Ok(Disposition::Relay)
        }
        SyncEvent::SyncRequest => Ok(Disposition::Snapshot),
        SyncEvent::FullSync(_) | SyncEvent::Connected { .. } => {
            Err(BoardError::UnexpectedEvent(event.name()))
        }
    }
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Register a client on a board, creating the board on first use. Returns
/// the full sync the client should start from.
pub async fn join_board(state: &AppState, board: &str, client_id: Uuid, tx: mpsc::Sender<Frame>) -> SyncEvent {
    let mut boards = state.boards.write().await;
    let board_state = boards.entry(board.to_owned()).or_default();
    board_state.clients.insert(client_id, tx);
    info!(
        %board,
        %client_id,
        clients = board_state.clients.len(),
        objects = board_state.objects.len(),
        "client joined board"
    );
    snapshot::build_full_sync(&board_state.objects)
}

/// Remove a client from a board. The board and its objects stay.
pub async fn part_board(state: &AppState, board: &str, client_id: Uuid) {
    let mut boards = state.boards.write().await;
    let Some(board_state) = boards.get_mut(board) else {
        return;
    };
    board_state.clients.remove(&client_id);
    info!(%board, %client_id, remaining = board_state.clients.len(), "client left board");
}

// =============================================================================
// INBOUND
// =============================================================================

/// What happened to one client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Applied and queued for this many peers.
    Relayed { peers: usize },
    /// Valid but a no-op for this board.
    Dropped(Ignored),
    /// The sender asked for a full sync; here it is.
    Snapshot(SyncEvent),
}

/// Apply a client's frame to its board and fan it out to the other clients.
///
/// The fan-out happens under the same write lock as the apply, so every
/// peer sees a board's events in the order the snapshot applied them.
///
/// # Errors
///
/// Returns [`BoardError::Protocol`] if the frame is not a sync event, or any
/// error from [`apply_event`].
pub async fn handle_event(state: &AppState, board: &str, sender: Uuid, frame: &Frame) -> Result<Handled, BoardError> {
    let event = SyncEvent::from_frame(frame)?;
    let mut boards = state.boards.write().await;
    let board_state = boards.entry(board.to_owned()).or_default();
    match apply_event(&mut board_state.objects, &event)? {
        Disposition::Relay => {
            let relayed = frame.clone().with_from(sender.to_string());
            let peers = fan_out(board_state, board, &relayed, Some(sender));
            debug!(
                %board,
                event = event.name(),
                id = event.object_id().unwrap_or("-"),
                objects = board_state.objects.len(),
                peers,
                "board: applied"
            );
            Ok(Handled::Relayed { peers })
        }
        Disposition::Drop(reason) => {
            debug!(%board, event = event.name(), ?reason, "board: ignored");
            Ok(Handled::Dropped(reason))
        }
        Disposition::Snapshot => Ok(Handled::Snapshot(snapshot::build_full_sync(&board_state.objects))),
    }
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Queue a frame for every client on a board, optionally excluding one.
/// Never waits; returns how many clients it was queued for.
pub fn fan_out(board_state: &BoardState, board: &str, frame: &Frame, exclude: Option<Uuid>) -> usize {
    let mut delivered = 0;
    for (client_id, tx) in &board_state.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: a client whose queue is full misses this frame.
        match tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => debug!(%board, %client_id, error = %e, "fan-out: skipped client"),
        }
    }
    delivered
}
