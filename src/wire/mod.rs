//! Wire-level concerns: PDU framing, HMAC authentication, and the
//! generated protobuf envelope/command types.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

/// HMAC-SHA1 sign/verify over the serialized `Command` bytes.
pub mod auth;
/// Fixed PDU header framing and protobuf+value body delimiting.
pub mod framer;
/// Generated protobuf bindings (`Message`, `Command`, ...).
pub mod proto;

pub use framer::{MAGIC, MAX_PROTO, MAX_VALUE, Pdu};
