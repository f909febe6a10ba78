use serde_json::json;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("board is on fire")]
struct OnFire;

impl ErrorCode for OnFire {
    fn error_code(&self) -> &'static str {
        "E_ON_FIRE"
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[test]
fn error_frame_carries_code_message_and_retryable() {
    let frame = error_frame(&OnFire, Some("object:added"));
    assert_eq!(frame.event, GATEWAY_ERROR);
    assert_eq!(frame.data[FRAME_CODE], "E_ON_FIRE");
    assert_eq!(frame.data[FRAME_MESSAGE], "board is on fire");
    assert_eq!(frame.data[FRAME_RETRYABLE], true);
    assert_eq!(frame.data[FRAME_REJECTED], "object:added");
}

#[test]
fn error_frame_without_rejected_event() {
    let frame = error_frame(&OnFire, None);
    assert!(frame.data.get(FRAME_REJECTED).is_none());
}

#[test]
fn codec_errors_have_codes() {
    let Err(json_err) = frames::decode_json("{") else {
        panic!("expected json error");
    };
    assert_eq!(json_err.error_code(), "E_INVALID_JSON");
    let Err(bin_err) = frames::decode_frame(&[0xff, 0xff, 0xff]) else {
        panic!("expected decode error");
    };
    assert_eq!(bin_err.error_code(), "E_DECODE");
    assert!(!bin_err.retryable());
}

#[test]
fn encoding_from_param() {
    assert_eq!(Encoding::from_param(None), Some(Encoding::Json));
    assert_eq!(Encoding::from_param(Some("json")), Some(Encoding::Json));
    assert_eq!(Encoding::from_param(Some("Protobuf")), Some(Encoding::Protobuf));
    assert_eq!(Encoding::from_param(Some("binary")), Some(Encoding::Protobuf));
    assert_eq!(Encoding::from_param(Some("xml")), None);
}

#[test]
fn json_encoding_uses_text_messages() {
    let frame = Frame::new("canvas:clear", json!({}));
    let msg = Encoding::Json.encode(&frame).unwrap();
    assert!(matches!(msg, Message::Text(_)));
    let back = decode_message(&msg).unwrap().unwrap();
    assert_eq!(back, frame);
}

#[test]
fn protobuf_encoding_uses_binary_messages() {
    let frame = Frame::new("object:removed", json!({"id": "a"})).with_from("client-1");
    let msg = Encoding::Protobuf.encode(&frame).unwrap();
    assert!(matches!(msg, Message::Binary(_)));
    let back = decode_message(&msg).unwrap().unwrap();
    assert_eq!(back.event, "object:removed");
    assert_eq!(back.from.as_deref(), Some("client-1"));
    assert_eq!(back.data["id"], "a");
}

#[test]
fn control_messages_are_not_frames() {
    assert!(decode_message(&Message::Ping(Vec::new().into())).is_none());
}

#[test]
fn malformed_text_is_an_error() {
    let msg = Message::Text("not json".into());
    assert!(matches!(decode_message(&msg), Some(Err(CodecError::Json(_)))));
}
