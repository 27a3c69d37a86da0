// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Injectable monotonic time source.
//!
//! The correlator and operation controller only ever ask "has this
//! deadline passed", so the whole collaborator is a single method. Tests
//! swap in a [`TestClock`] to make expiry deterministic without sleeping.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock tests can advance by hand. Stores an offset from its own
/// construction instant rather than a raw `Instant`, since there's no way
/// to construct an arbitrary `Instant` outside `std`.
#[derive(Clone)]
pub struct TestClock {
    base: Instant,
    offset_millis: Arc<AtomicU64>,
}

impl TestClock {
    pub fn new() -> Self {
        TestClock {
            base: Instant::now(),
            offset_millis: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}
