// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Session state shared by every operation on a connection: identity,
//! cluster version, the connection ID the drive assigned at handshake,
//! the monotonically increasing sequence counter, and the poisoning latch
//! that blocks submission once a write has failed.
//!
//! Grounded on `original_source/kinetic_session.c`'s `KineticSession`
//! (cluster version, identity, sequence counter) and on
//! `original_source/bus.c`'s "a socket that has seen a partial write is
//! never reused" rule, generalized here into an explicit state machine
//! rather than an implicit socket-table entry.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

use tokio::sync::Notify;

use crate::cfg::config::Identity;

/// Lifecycle of a session's ability to accept new submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake not yet complete; submissions queue behind `ready`.
    Handshaking,
    /// Handshake complete, connection usable.
    Active,
    /// A partial write (or other unrecoverable transport fault) poisoned
    /// the connection. No further PDU is written to the socket; every
    /// subsequent `execute` fails fast with `Status::SocketError`.
    Failed,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Handshaking,
            1 => SessionState::Active,
            _ => SessionState::Failed,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            SessionState::Handshaking => 0,
            SessionState::Active => 1,
            SessionState::Failed => 2,
        }
    }
}

/// Per-connection state. Cheaply shareable: every field is atomic or an
/// `Arc`-friendly primitive, so a `Session` is typically held behind an
/// `Arc` and cloned across the read loop, the controller, and callers.
pub struct Session {
    pub identity: Identity,
    cluster_version: AtomicI64,
    connection_id: AtomicI64,
    next_sequence: AtomicU64,
    state: AtomicU8,
    ready: Notify,
}

/// Sentinel stored in `connection_id` before the handshake assigns a real
/// one. Kinetic connection IDs are assigned by the drive and are never
/// observed to be negative in practice, but nothing in the protocol rules
/// it out, so this is merely "not yet set" rather than "invalid".
const NO_CONNECTION_ID: i64 = i64::MIN;

impl Session {
    pub fn new(identity: Identity, cluster_version: i64) -> Self {
        Session {
            identity,
            cluster_version: AtomicI64::new(cluster_version),
            connection_id: AtomicI64::new(NO_CONNECTION_ID),
            // Sequence numbers start at 1: the wire protocol never issues
            // sequence 0, matching the worked examples' ackSequence values.
            next_sequence: AtomicU64::new(1),
            state: AtomicU8::new(SessionState::Handshaking.to_u8()),
            ready: Notify::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn cluster_version(&self) -> i64 {
        self.cluster_version.load(Ordering::Acquire)
    }

    pub fn set_cluster_version(&self, version: i64) {
        self.cluster_version.store(version, Ordering::Release);
    }

    pub fn connection_id(&self) -> Option<i64> {
        match self.connection_id.load(Ordering::Acquire) {
            NO_CONNECTION_ID => None,
            id => Some(id),
        }
    }

    /// Completes the handshake: records the drive-assigned connection ID
    /// and releases every task waiting in [`Session::wait_ready`]. A no-op
    /// if the session has already been poisoned — `Failed` is terminal and
    /// a late handshake PDU must not resurrect it.
    pub fn mark_ready(&self, connection_id: i64) {
        let transitioned = self
            .state
            .compare_exchange(
                SessionState::Handshaking.to_u8(),
                SessionState::Active.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if transitioned {
            self.connection_id.store(connection_id, Ordering::Release);
        }
        self.ready.notify_waiters();
    }

    /// Poisons the session. Idempotent and irreversible.
    pub fn mark_failed(&self) {
        self.state
            .store(SessionState::Failed.to_u8(), Ordering::Release);
        self.ready.notify_waiters();
    }

    /// Resolves once the handshake has completed, or immediately if it
    /// already has (or the session is already failed). Callers must
    /// re-check `state()` after waking, since `Failed` also releases the
    /// latch.
    pub async fn wait_ready(&self) {
        if self.state() != SessionState::Handshaking {
            return;
        }
        let notified = self.ready.notified();
        if self.state() != SessionState::Handshaking {
            return;
        }
        notified.await;
    }

    /// Allocates the next sequence number for an outgoing command. Never
    /// repeats within the lifetime of a `Session`.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }
}
