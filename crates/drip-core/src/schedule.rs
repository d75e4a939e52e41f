// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Slot-indexed schedule of send and confirm events.
//!
//! Ordering invariants:
//! - Order within a bucket list is significant and preserved.
//! - `prepend` concatenates most-recent-first: the latest prepend to a
//!   slot comes first within that slot's bucket.
//! - `pop` sweeps every bucket at or before the requested slot, merged in
//!   ascending slot order, so past buckets never accumulate even when a
//!   retry policy reschedules into the slot currently being drained.

use std::collections::BTreeMap;
use std::mem;

use crate::ident::TxId;
use crate::payload::TxAux;
use crate::slot::Slot;

/// Number of times a send obligation has been transmitted.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct SubmissionCount(pub u32);

impl SubmissionCount {
    /// Count carried by a never-transmitted event.
    pub const ZERO: Self = Self(0);

    /// The count after one more transmission, saturating.
    #[must_use]
    pub const fn bump(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for SubmissionCount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An obligation to transmit a transaction at a scheduled slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SendEvent {
    /// Transaction to transmit.
    pub id: TxId,
    /// Blob handed to the transmit capability.
    pub aux: TxAux,
    /// Transmissions performed so far for this obligation.
    pub submissions: SubmissionCount,
}

/// An obligation to check at a scheduled slot whether a transaction is
/// still pending, evicting it if so.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ConfirmEvent {
    /// Transaction to probe.
    pub id: TxId,
}

/// Events bucketed at a single slot.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct EventBucket {
    /// Send obligations, in scheduling order.
    pub to_send: Vec<SendEvent>,
    /// Confirmation probes, in scheduling order.
    pub to_confirm: Vec<ConfirmEvent>,
}

impl EventBucket {
    /// A bucket holding only send events.
    #[must_use]
    pub fn sends(to_send: Vec<SendEvent>) -> Self {
        Self {
            to_send,
            to_confirm: Vec::new(),
        }
    }

    /// A bucket holding only confirmation probes.
    #[must_use]
    pub fn confirms(to_confirm: Vec<ConfirmEvent>) -> Self {
        Self {
            to_send: Vec::new(),
            to_confirm,
        }
    }

    /// Whether the bucket holds no events at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_send.is_empty() && self.to_confirm.is_empty()
    }

    fn prepend(&mut self, mut newer: EventBucket) {
        newer.to_send.append(&mut self.to_send);
        newer.to_confirm.append(&mut self.to_confirm);
        *self = newer;
    }

    fn absorb(&mut self, mut older: EventBucket) {
        self.to_send.append(&mut older.to_send);
        self.to_confirm.append(&mut older.to_confirm);
    }
}

/// Outstanding obligations: slot-indexed buckets plus the nursery of
/// dependency-deferred send events.
///
/// Together the buckets and the nursery completely describe what the
/// scheduler still owes the network.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Schedule {
    slots: BTreeMap<i64, EventBucket>,
    nursery: Vec<SendEvent>,
}

impl Schedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns every bucket scheduled at or before `slot`,
    /// merged in ascending slot order. The nursery is untouched.
    pub fn pop(&mut self, slot: Slot) -> EventBucket {
        let later = match slot.index().checked_add(1) {
            Some(split) => self.slots.split_off(&split),
            None => BTreeMap::new(),
        };
        let due = mem::replace(&mut self.slots, later);
        let mut bucket = EventBucket::default();
        for b in due.into_values() {
            bucket.absorb(b);
        }
        bucket
    }

    /// Concatenates `events` into the bucket at `slot`, creating it if
    /// absent. The most recent prepend comes first within the bucket.
    pub fn prepend(&mut self, slot: Slot, events: EventBucket) {
        if events.is_empty() {
            return;
        }
        self.slots.entry(slot.index()).or_default().prepend(events);
    }

    /// Send events deferred because an ancestor was not yet ready.
    #[must_use]
    pub fn nursery(&self) -> &[SendEvent] {
        &self.nursery
    }

    /// Replaces the nursery wholesale.
    ///
    /// Replaced, never merged: each tick already folds the previous
    /// nursery into its candidate set, and merging would grow the nursery
    /// without bound.
    pub fn set_nursery(&mut self, events: Vec<SendEvent>) {
        self.nursery = events;
    }

    /// The bucket scheduled at exactly `slot`, if any.
    #[must_use]
    pub fn bucket(&self, slot: Slot) -> Option<&EventBucket> {
        self.slots.get(&slot.index())
    }

    /// Slots that currently hold a bucket, in ascending index order.
    pub fn scheduled_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().map(|&key| Slot::from_index(key))
    }

    /// Buckets scheduled at or before `slot`, ascending, without draining.
    pub(crate) fn peek_due(&self, slot: Slot) -> impl Iterator<Item = &EventBucket> {
        self.slots.range(..=slot.index()).map(|(_, bucket)| bucket)
    }

    /// Whether no obligations remain anywhere (buckets or nursery).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.nursery.is_empty()
    }
}
