// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Option<Ticket> {
        match self.issued.load(Ordering::SeqCst) {
            0 => None,
            n => Some(Ticket(n)),
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }
}

/// Holds the result of the most recently issued request only. A response
/// that arrives after a newer request was issued is dropped.
#[derive(Debug, Default)]
pub struct LatestView<T> {
    seq: RequestSequencer,
    slot: Mutex<Option<(Ticket, T)>>,
}

impl<T> LatestView<T> {
    pub fn new() -> Self {
        Self {
            seq: RequestSequencer::new(),
            slot: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> Ticket {
        self.seq.issue()
    }

    /// Stores `value` if `ticket` is still the latest; returns whether it was kept.
    pub fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if !self.seq.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.seq(),
                latest = self.seq.latest().map(|t| t.seq()),
                "discarding stale response"
            );
            return false;
        }
        *slot = Some((ticket, value));
        true
    }

    pub fn ticket(&self) -> Option<Ticket> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|(t, _)| *t)
    }

    pub fn current(&self) -> Option<T>
    where
        T: Clone,
    {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|(_, v)| v.clone())
    }
}
