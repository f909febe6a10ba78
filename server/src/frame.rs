//! Relay-side frame helpers.
//!
//! DESIGN
//! ======
//! The envelope itself lives in the `frames` crate. This module adds what
//! only the relay needs: typed errors mapped to grepable codes, the
//! `gateway:error` frame those errors become, and the per-connection choice
//! between JSON text and protobuf binary websocket messages.

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;

use axum::extract::ws::Message;
use frames::{CodecError, Frame};

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Event name for errors sent back to the offending client.
pub const GATEWAY_ERROR: &str = "gateway:error";

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

/// Frame data key for the retryable flag on error frames.
pub const FRAME_RETRYABLE: &str = "retryable";

/// Frame data key naming the event that was rejected.
pub const FRAME_REJECTED: &str = "rejected";

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Build a `gateway:error` frame from a typed error. `rejected` names the
/// inbound event, when there was one.
#[must_use]
pub fn error_frame(err: &(impl ErrorCode + ?Sized), rejected: Option<&str>) -> Frame {
    let mut frame = Frame::new(GATEWAY_ERROR, serde_json::json!({}))
        .with_data(FRAME_CODE, err.error_code())
        .with_data(FRAME_MESSAGE, err.to_string())
        .with_data(FRAME_RETRYABLE, err.retryable());
    if let Some(event) = rejected {
        frame = frame.with_data(FRAME_REJECTED, event);
    }
    frame
}

impl ErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::Json(_) => "E_INVALID_JSON",
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// How one connection's frames travel over the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// JSON in text messages.
    #[default]
    Json,
    /// Protobuf in binary messages.
    Protobuf,
}

impl Encoding {
    /// Parse the `encoding` query parameter.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            None | Some("" | "json") => Some(Self::Json),
            Some("protobuf" | "proto" | "binary") => Some(Self::Protobuf),
            Some(_) => None,
        }
    }

    /// Encode a frame into a websocket message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if JSON serialization fails.
    pub fn encode(self, frame: &Frame) -> Result<Message, CodecError> {
        match self {
            Self::Json => Ok(Message::Text(frames::encode_json(frame)?.into())),
            Self::Protobuf => Ok(Message::Binary(frames::encode_frame(frame).into())),
        }
    }
}

/// Decode an inbound websocket message. Text is JSON and binary is protobuf,
/// whatever the connection's outbound encoding. `None` for control messages.
#[must_use]
pub fn decode_message(msg: &Message) -> Option<Result<Frame, CodecError>> {
    match msg {
        Message::Text(text) => Some(frames::decode_json(text.as_str())),
        Message::Binary(bytes) => Some(frames::decode_frame(bytes)),
        _ => None,
    }
}
