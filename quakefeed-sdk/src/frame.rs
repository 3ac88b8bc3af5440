//! Inbound frame classification.
//!
//! Control literals are matched exactly before any JSON parsing is attempted.

use serde_json::Value;

use crate::error::FeedError;

/// Handshake acknowledgement sent by the server after the socket opens.
pub const HELLO: &str = "hello";
/// Heartbeat token, both directions.
pub const HEARTBEAT: &str = "hb";
/// Channel assigned to data frames that do not name one.
pub const UNKNOWN_CHANNEL: &str = "unknown";

/// A classified inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Hello,
    Heartbeat,
    Data { channel: String, payload: Value },
}

/// Classify one text frame.
///
/// Data frames are JSON objects shaped `{"channel": .., "message": ..}`.
/// A missing `channel` becomes [`UNKNOWN_CHANNEL`]; a missing `message`
/// makes the whole object the payload.
pub fn classify(text: &str) -> Result<Frame, FeedError> {
    match text {
        HELLO => return Ok(Frame::Hello),
        HEARTBEAT => return Ok(Frame::Heartbeat),
        _ => {}
    }

    let value: Value = serde_json::from_str(text).map_err(|e| FeedError::Decode {
        raw: text.to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(mut obj) = value else {
        return Err(FeedError::Decode {
            raw: text.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    let channel = obj
        .get("channel")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_CHANNEL)
        .to_string();

    let payload = match obj.remove("message") {
        Some(message) => message,
        None => Value::Object(obj),
    };

    Ok(Frame::Data { channel, payload })
}
