// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Operation-level concerns: the command builder seam, session state, and
//! the controller that drives one against a transport.

/// The `CommandBuilder` trait and the `BuiltCommand` it produces.
pub mod builder;
/// The top-level Session/Connection component: dial, handshake, disconnect.
pub mod connection;
/// The operation controller: builds, submits, and translates replies.
pub mod controller;
/// The one concrete command builder this crate implements end to end.
pub mod noop;
/// Per-connection identity, sequencing, and poisoning state.
pub mod session;

pub use builder::{BuiltCommand, CommandBuilder};
pub use connection::Connection;
pub use controller::{OperationController, OperationResult};
pub use session::{Session, SessionState};
