// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Generated protobuf bindings for `proto/kinetic.proto`.
//!
//! `Message` is the wire envelope; `Command` carries the header/status
//! fields the operation controller and correlator need. Per-command body
//! framing (Get/Put/Delete/...) is out of scope here and travels as an
//! opaque `bytes` blob (`Command::body`) owned by external command
//! builders.

#![allow(clippy::large_enum_variant)]

include!(concat!(env!("OUT_DIR"), "/kinetic.rs"));

impl message::AuthType {
    pub fn is_unsolicited_status(self) -> bool {
        matches!(self, message::AuthType::Unsolicitedstatus)
    }
}

impl Command {
    pub fn ack_sequence(&self) -> Option<i64> {
        self.header.as_ref().and_then(|h| h.ack_sequence)
    }

    pub fn connection_id(&self) -> Option<i64> {
        self.header.as_ref().and_then(|h| h.connection_id)
    }

    pub fn status_code(&self) -> Option<command::StatusCode> {
        let code = self.status.as_ref()?.code?;
        command::StatusCode::try_from(code).ok()
    }
}
