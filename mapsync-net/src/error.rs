//! Error types for the network layer.

use std::io;

use thiserror::Error;

/// Failure to establish an outbound connection. The link stays down; the
/// caller may simply retry with a corrected address.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid remote address: {0}")]
    InvalidAddress(String),
    #[error("connection attempt timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Io(#[from] io::Error),
}

/// A malformed wire frame or payload. Recovered by discarding the frame;
/// the connection stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame missing start/end markers")]
    MissingMarkers,
    #[error("unparseable message: {0}")]
    BadPayload(#[from] serde_json::Error),
}
