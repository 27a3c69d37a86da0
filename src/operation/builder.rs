// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! The seam between the operation controller and per-command logic.
//!
//! Per-command request/response shapes (Get, Put, Delete, ...) are out of
//! scope for the controller itself; a [`CommandBuilder`] is how a
//! higher-level API plugs one in without the controller knowing anything
//! about `MessageType` beyond what it needs to route a reply back.

use bytes::Bytes;

use crate::wire::proto::Command;

/// A fully-built command, ready to be handed to the transport: the header
/// and per-command fields the builder populated, and the opaque value
/// payload that travels alongside it in the PDU's Data Segment.
pub struct BuiltCommand {
    pub command: Command,
    pub value: Bytes,
}

/// Constructs the `Command` and value payload for one request, and
/// interprets the matching reply.
///
/// Implementations only fill in the parts of `Command` specific to their
/// operation; the controller owns `Header.cluster_version`,
/// `Header.connection_id`, `Header.sequence`, and `Header.timeout`.
pub trait CommandBuilder: Send + Sync {
    type Response: Send + 'static;

    /// Builds the outgoing command. `sequence` and `timeout` are already
    /// decided by the controller and passed through for builders that
    /// need to read them back (e.g. to embed in diagnostic messages).
    fn build(&self) -> BuiltCommand;

    /// Interprets a matched reply into this builder's response type. Only
    /// called when the reply's status was `SUCCESS`; failure statuses are
    /// reported to the caller as a `Status` without reaching the builder.
    fn parse_response(&self, reply_command: &Command, reply_value: Bytes) -> Self::Response;
}
