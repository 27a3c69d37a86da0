// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Construction- and connect-time error types.
//!
//! Once a session is established, operation results are reported through
//! [`crate::status::Status`], not these types — `ConnectError` only covers
//! the window before a connection exists, and `BuildError` covers command
//! construction that happens entirely client-side.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to resolve or reach {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("handshake timed out waiting for the unsolicited status PDU")]
    HandshakeTimeout,

    #[error("handshake PDU failed to decode: {0}")]
    HandshakeFraming(#[from] crate::wire::framer::FrameError),

    #[error("handshake PDU failed to parse as a Command: {0}")]
    HandshakeDecode(#[source] prost::DecodeError),

    #[error("server's first PDU was not an unsolicited status message")]
    NotUnsolicitedStatus,

    #[error("server's unsolicited status PDU carried no connectionID")]
    MissingConnectionId,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("value payload of {0} bytes exceeds MAX_VALUE ({max})", max = crate::wire::MAX_VALUE)]
    ValueTooLarge(usize),

    #[error("command serialization produced {0} bytes, exceeding MAX_PROTO ({max})", max = crate::wire::MAX_PROTO)]
    CommandTooLarge(usize),

    #[error("session is not ready to build commands: {0}")]
    SessionNotReady(String),
}

/// `BuildError` never reaches the wire; the controller rejects it before a
/// sequence number is even allocated, so it folds into the same taxonomy
/// the caller already handles every other failure through.
impl From<BuildError> for crate::status::Status {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::ValueTooLarge(_) | BuildError::CommandTooLarge(_) => {
                crate::status::Status::InvalidRequest
            },
            BuildError::SessionNotReady(_) => crate::status::Status::SocketError,
        }
    }
}
