// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Sequence-number-keyed registry of in-flight operations.
//!
//! Mirrors the teacher client's `sending`/`reciver` `DashMap<u32, ...>`
//! pattern (`client/client.rs`), generalized from iSCSI's initiator task
//! tag to Kinetic's `Header.sequence`, and extended with a per-entry
//! deadline since Kinetic operations carry their own timeout rather than
//! relying solely on socket-level timeouts.
//!
//! `match_reply` and `expire` race against each other for the same entry:
//! a reply can arrive on the read loop in the same instant a sweep decides
//! the deadline has passed. Both go through `DashMap::remove`, which is
//! atomic per key, so exactly one of them observes `Some` and the other
//! observes `None` — there is no window where both complete the same
//! waiter.

use std::time::Instant;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::{status::TransportOutcome, wire::proto::Command};

/// What the correlator hands back to whichever side wins the race for a
/// given sequence number.
#[derive(Debug)]
pub struct CorrelatedReply {
    pub command: Command,
    pub value: Bytes,
}

/// A waiter either gets its matched reply, or one of the transport
/// outcomes from `spec.md` §4.3's table explaining why it didn't.
pub type CorrelatorResult = Result<CorrelatedReply, TransportOutcome>;

struct Entry {
    deadline: Instant,
    reply_tx: oneshot::Sender<CorrelatorResult>,
}

/// Tracks in-flight operations by sequence number, pairing server replies
/// and deadline sweeps with the waiter that registered them.
#[derive(Default)]
pub struct Correlator {
    inflight: DashMap<u64, Entry>,
}

impl Correlator {
    pub fn new() -> Self {
        Correlator {
            inflight: DashMap::new(),
        }
    }

    /// Registers a waiter for `sequence`, returning the receiving half of
    /// its completion channel. Panics (via `DashMap::insert` silently
    /// overwriting) is not possible by construction: sequence numbers come
    /// from `Session::next_sequence`, which never repeats within a
    /// session's lifetime.
    pub fn register(
        &self,
        sequence: u64,
        deadline: Instant,
    ) -> oneshot::Receiver<CorrelatorResult> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inflight.insert(sequence, Entry { deadline, reply_tx });
        reply_rx
    }

    /// Called by the read loop when a reply with a matching `ack_sequence`
    /// arrives. Consumes the entry; a second call for the same sequence
    /// (duplicate or already-expired) is a no-op.
    pub fn match_reply(&self, sequence: u64, command: Command, value: Bytes) -> bool {
        match self.inflight.remove(&sequence) {
            Some((_, entry)) => {
                let _ = entry.reply_tx.send(Ok(CorrelatedReply { command, value }));
                true
            },
            None => false,
        }
    }

    /// Resolves a waiter with a transport-level failure instead of a
    /// reply: a write that failed outright, an HMAC mismatch on the
    /// matching reply, or any other outcome from `spec.md` §4.3's table.
    /// A no-op if the sequence has already been resolved.
    pub fn fail(&self, sequence: u64, outcome: TransportOutcome) -> bool {
        match self.inflight.remove(&sequence) {
            Some((_, entry)) => {
                let _ = entry.reply_tx.send(Err(outcome));
                true
            },
            None => false,
        }
    }

    /// Sweeps entries whose deadline has passed as of `now`, failing each
    /// with [`TransportOutcome::RxTimeout`]. Returns how many were
    /// expired.
    pub fn expire_due(&self, now: Instant) -> usize {
        let due: Vec<u64> = self
            .inflight
            .iter()
            .filter(|e| e.deadline <= now)
            .map(|e| *e.key())
            .collect();
        let mut expired = 0;
        for sequence in due {
            if self.fail(sequence, TransportOutcome::RxTimeout) {
                expired += 1;
            }
        }
        expired
    }

    /// Fails every still-registered waiter with `status`, for use when the
    /// transport is shutting down and no further replies will ever arrive.
    /// Per `spec.md` §4.4, the status is the caller's to choose — a
    /// deliberate `disconnect()` and an unexpected socket death both drain
    /// the same map, but may want to report different outcomes.
    pub fn drain(&self, status: TransportOutcome) {
        let keys: Vec<u64> = self.inflight.iter().map(|e| *e.key()).collect();
        for sequence in keys {
            self.fail(sequence, status);
        }
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}
