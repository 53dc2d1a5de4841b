//! Network layer for mapsync peer synchronization.
//!
//! This crate provides the wire protocol and the connection manager that
//! keeps exactly one peer link alive, mirrors local library changes to
//! the peer, and applies the peer's changes to the remote source.

pub mod error;
pub mod framing;
pub mod manager;
pub mod protocol;

pub use error::{ConnectError, ProtocolError};
pub use framing::{read_frame, write_frame};
pub use manager::{ConfirmFn, NetworkManager, SERVICE_PORT};
pub use protocol::{IgnorePayload, Message, MessageType, MSG_END, MSG_START};
