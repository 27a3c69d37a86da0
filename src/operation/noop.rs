// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! NOOP: the one concrete, fully-implemented command in this crate.
//!
//! Mirrors the teacher's NOP-Out/NOP-In keepalive exchange
//! (`handlers/nop.rs`, `state_machine/nop_states.rs`): a command carrying
//! no payload, whose only purpose is to exercise the round trip (and, on
//! a real drive, to keep the connection alive). Every other command type
//! (Get, Put, Delete, ...) is out of scope; `NoopBuilder` exists to give
//! the controller, correlator, and session handshake something concrete
//! to drive end to end.

use bytes::Bytes;

use crate::{
    operation::builder::{BuiltCommand, CommandBuilder},
    wire::proto::{Command, command},
};

/// Builds a bodyless `NOOP` command and reads back its `NOOP_RESPONSE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBuilder;

/// `NoopBuilder`'s response carries nothing beyond "it came back" — the
/// controller already surfaces the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoopResponse;

impl CommandBuilder for NoopBuilder {
    type Response = NoopResponse;

    fn build(&self) -> BuiltCommand {
        let command = Command {
            header: Some(command::Header {
                message_type: command::MessageType::Noop as i32,
                ..Default::default()
            }),
            ..Default::default()
        };
        BuiltCommand {
            command,
            value: Bytes::new(),
        }
    }

    fn parse_response(&self, _reply_command: &Command, _reply_value: Bytes) -> Self::Response {
        NoopResponse
    }
}
