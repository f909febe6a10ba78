//! Sync events and their mapping onto wire frames.
//!
//! | Event | Payload | Direction |
//! |-------|---------|-----------|
//! | `object:added` | serialized object | both |
//! | `object:modified` | serialized object | both |
//! | `object:removed` | serialized object or `{id}` | both |
//! | `canvas:clear` | `{}` | both |
//! | `object:sync` | `{objects: [...]}` | relay to client |
//! | `connect` | `{client_id}` | relay to client |
//! | `sync:request` | `{}` | client to relay |

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use frames::Frame;
use serde_json::{Value, json};
use tracing::warn;

use crate::doc::WireObject;
use crate::wire;

pub const OBJECT_ADDED: &str = "object:added";
pub const OBJECT_MODIFIED: &str = "object:modified";
pub const OBJECT_REMOVED: &str = "object:removed";
pub const CANVAS_CLEAR: &str = "canvas:clear";
pub const OBJECT_SYNC: &str = "object:sync";
pub const CONNECT: &str = "connect";
pub const SYNC_REQUEST: &str = "sync:request";

/// One protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Added(WireObject),
    Modified(WireObject),
    Removed(WireObject),
    ClearAll,
    FullSync(Vec<WireObject>),
    /// Transport greeting carrying this connection's id.
    Connected { client_id: String },
    /// Ask the other side for a full sync.
    SyncRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("invalid {event} payload: {reason}")]
    InvalidPayload { event: &'static str, reason: &'static str },
}

impl SyncEvent {
    /// Wire event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Added(_) => OBJECT_ADDED,
            Self::Modified(_) => OBJECT_MODIFIED,
            Self::Removed(_) => OBJECT_REMOVED,
            Self::ClearAll => CANVAS_CLEAR,
            Self::FullSync(_) => OBJECT_SYNC,
            Self::Connected { .. } => CONNECT,
            Self::SyncRequest => SYNC_REQUEST,
        }
    }

    /// Target object id for single-object events.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Removed(obj) => wire::wire_id(obj),
            _ => None,
        }
    }

    /// Payload as it goes on the wire.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Added(obj) | Self::Modified(obj) | Self::Removed(obj) => Value::Object(obj.clone()),
            Self::ClearAll | Self::SyncRequest => json!({}),
            Self::FullSync(objects) => {
                let list: Vec<Value> = objects.iter().cloned().map(Value::Object).collect();
                json!({ "objects": list })
            }
            Self::Connected { client_id } => json!({ "client_id": client_id }),
        }
    }

    /// Wrap into a fresh frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        Frame::new(self.name(), self.payload())
    }

    /// Parse a frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownEvent`] for event names outside the
    /// protocol, and [`ProtocolError::InvalidPayload`] when the payload does
    /// not have the shape the event requires.
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.event.as_str() {
            OBJECT_ADDED => Ok(Self::Added(object_payload(OBJECT_ADDED, &frame.data)?)),
            OBJECT_MODIFIED => Ok(Self::Modified(object_payload(OBJECT_MODIFIED, &frame.data)?)),
            OBJECT_REMOVED => {
                let obj = object_payload(OBJECT_REMOVED, &frame.data)?;
                if wire::wire_id(&obj).is_none() {
                    return Err(ProtocolError::InvalidPayload { event: OBJECT_REMOVED, reason: "id required" });
                }
                Ok(Self::Removed(obj))
            }
            CANVAS_CLEAR => Ok(Self::ClearAll),
            OBJECT_SYNC => {
                let Some(list) = frame.data.get("objects").and_then(Value::as_array) else {
                    return Err(ProtocolError::InvalidPayload { event: OBJECT_SYNC, reason: "objects array required" });
                };
                let mut objects = Vec::with_capacity(list.len());
                for entry in list {
                    match entry {
                        Value::Object(obj) => objects.push(obj.clone()),
                        other => warn!(entry = %other, "sync: skipping non-object entry"),
                    }
                }
                Ok(Self::FullSync(objects))
            }
            CONNECT => {
                let Some(client_id) = frame.data.get("client_id").and_then(Value::as_str) else {
                    return Err(ProtocolError::InvalidPayload { event: CONNECT, reason: "client_id required" });
                };
                Ok(Self::Connected { client_id: client_id.to_owned() })
            }
            SYNC_REQUEST => Ok(Self::SyncRequest),
            other => Err(ProtocolError::UnknownEvent(other.to_owned())),
        }
    }
}

fn object_payload(event: &'static str, data: &Value) -> Result<WireObject, ProtocolError> {
    data.as_object()
        .cloned()
        .ok_or(ProtocolError::InvalidPayload { event, reason: "object payload required" })
}
