//! Defines the JSON wire format exchanged with the chat backend.
//!
//! Outbound frames are envelopes scoped to one [`SessionId`]; inbound frames
//! are objects carrying any combination of the recognized event fields.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field carrying one streamed token of the reply.
pub const STREAM_FIELD: &str = "on_chat_model_stream";
/// Field marking the reply as finished.
pub const END_FIELD: &str = "on_chat_model_end";
/// Field carrying the out-of-band trigger.
pub const TRIGGER_FIELD: &str = "on_easter_egg";

/// Messages sent from the client to the backend.
///
/// Field order is significant for readers of the raw wire log: `session`,
/// then `message` (turns only), then `init`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutboundEnvelope<'a> {
    pub session: &'a SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    pub init: bool,
}

impl<'a> OutboundEnvelope<'a> {
    /// The first frame on every freshly opened connection.
    pub fn handshake(session: &'a SessionId) -> Self {
        Self {
            session,
            message: None,
            init: true,
        }
    }

    /// One user turn.
    pub fn turn(session: &'a SessionId, message: &'a str) -> Self {
        Self {
            session,
            message: Some(message),
            init: false,
        }
    }

    pub fn encode(&self) -> String {
        // Only strings and bools are serialized here, which cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Serializes the handshake frame for `session`.
pub fn encode_handshake(session: &SessionId) -> String {
    OutboundEnvelope::handshake(session).encode()
}

/// Serializes a turn frame carrying `message`.
pub fn encode_turn(session: &SessionId, message: &str) -> String {
    OutboundEnvelope::turn(session, message).encode()
}

/// A typed event decoded from one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A fragment of the reply to append.
    StreamToken(String),
    /// The reply for the current turn is complete.
    StreamEnd,
    /// The decorative out-of-band signal.
    Trigger,
    /// The frame could not be parsed; carries the parser's reason.
    Malformed(String),
}

/// The recognized shape of an inbound frame. Unknown keys are ignored.
#[derive(Deserialize, Debug, Default)]
struct InboundFrame {
    #[serde(default)]
    on_chat_model_stream: Option<Value>,
    #[serde(default)]
    on_chat_model_end: Option<Value>,
    #[serde(default)]
    on_easter_egg: Option<Value>,
}

/// Decodes one raw frame into zero or more events.
///
/// Events come out in a fixed order: token, end, trigger. A payload that is
/// not JSON yields a single [`InboundEvent::Malformed`]. Valid JSON that is
/// not an object carries no recognized fields and yields nothing. A field only
/// counts when its value is truthy, so `""`, `false`, `0` and `null` are
/// ignored.
pub fn decode_frame(raw: &[u8]) -> Vec<InboundEvent> {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(e) => return vec![InboundEvent::Malformed(e.to_string())],
    };
    if !value.is_object() {
        return Vec::new();
    }
    let frame: InboundFrame = match serde_json::from_value(value) {
        Ok(frame) => frame,
        Err(e) => return vec![InboundEvent::Malformed(e.to_string())],
    };

    let mut events = Vec::new();
    if let Some(token) = frame.on_chat_model_stream.as_ref().and_then(token_text) {
        events.push(InboundEvent::StreamToken(token));
    }
    if frame.on_chat_model_end.as_ref().is_some_and(is_truthy) {
        events.push(InboundEvent::StreamEnd);
    }
    if frame.on_easter_egg.as_ref().is_some_and(is_truthy) {
        events.push(InboundEvent::Trigger);
    }
    events
}

/// Text to append for a stream field, if it is truthy.
///
/// Non-string scalars are appended as their JSON text.
fn token_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// JavaScript truthiness over a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
