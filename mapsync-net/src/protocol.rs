//! Wire message types and frame encoding.
//!
//! A frame is three text lines: the literal start marker, one line of
//! JSON carrying a [`Message`], and the literal end marker. The message's
//! `content` is itself a serialized JSON document carried as a string, so
//! beatmap names with quotes, braces or backslashes survive unharmed.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

pub const MSG_START: &str = "MSG_START";
pub const MSG_END: &str = "MSG_END";

/// Message kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// A full library snapshot.
    List,
    /// One ignore-flag change, addressed by position.
    Ignore,
    /// Ask the peer for its current library snapshot.
    Request,
}

/// One wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
}

impl Message {
    pub fn new(kind: MessageType, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn request() -> Self {
        Self::new(MessageType::Request, "")
    }
}

/// IGNORE payload. The side is named relative to the sender:
/// `local_side == true` means the sender's own library changed, which is
/// the receiver's remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePayload {
    #[serde(rename = "isLocalSource")]
    pub local_side: bool,
    #[serde(rename = "i")]
    pub index: usize,
    #[serde(rename = "ignore")]
    pub ignored: bool,
}

/// Encode a message into a full three-line frame.
pub fn encode(msg: &Message) -> String {
    // A Message is two plain fields; serialization cannot fail.
    let body = serde_json::to_string(msg).expect("Message is always serializable");
    format!("{MSG_START}\n{body}\n{MSG_END}")
}

/// Decode a full frame back into a message, stripping the markers.
pub fn decode(frame: &str) -> Result<Message, ProtocolError> {
    let body = frame
        .strip_prefix(MSG_START)
        .and_then(|rest| rest.strip_suffix(MSG_END))
        .ok_or(ProtocolError::MissingMarkers)?;
    Ok(serde_json::from_str(body.trim())?)
}
