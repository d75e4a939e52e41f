// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduler core: pending set, schedule, slot clock, and the injected
//! resubmission function.
//!
//! # Invariants
//! - Every send event handed to the resubmission function names a
//!   transaction that is pending at the start of its tick.
//! - A tick is all-or-nothing: a [`SchedulerError::LoopDetected`] failure
//!   leaves the scheduler byte-for-byte unchanged.
//! - The nursery is replaced each tick, never merged; its previous
//!   contents are already part of the tick's candidate set.

use std::collections::BTreeSet;
use std::mem;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::gating::{partition_sendable, topological_order};
use crate::ident::TxId;
use crate::pending::PendingSet;
use crate::policy::RetryPolicy;
use crate::resubmit::{DefaultResubmission, Resubmission, Transmit};
use crate::schedule::{ConfirmEvent, EventBucket, Schedule, SendEvent, SubmissionCount};
use crate::slot::Slot;

/// Errors surfaced by [`Scheduler::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The send events due this slot form a dependency cycle among the
    /// listed transactions; the tick was aborted without touching state.
    #[error("dependency loop detected among {} pending transactions", .0.len())]
    LoopDetected(Vec<TxId>),
}

/// The submission scheduler.
///
/// Owns the pending set, the schedule, and the slot clock; everything else
/// is injected. A wallet announces batches with [`Scheduler::add_pending`],
/// the chain-adoption pipeline retires ids with [`Scheduler::rem_pending`],
/// and the host clock drives [`Scheduler::tick`] once per slot. The
/// scheduler is a single-owner logical actor: all methods take `&mut self`
/// or `&self`, hold no locks, and suspend only inside the injected
/// transmit capability.
pub struct Scheduler {
    pending: PendingSet,
    schedule: Schedule,
    slot: Slot,
    resubmission: Box<dyn Resubmission>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending)
            .field("schedule", &self.schedule)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Fresh scheduler at slot zero with no pending transactions and no
    /// scheduled obligations.
    #[must_use]
    pub fn new(resubmission: Box<dyn Resubmission>) -> Self {
        Self {
            pending: PendingSet::new(),
            schedule: Schedule::new(),
            slot: Slot::ZERO,
            resubmission,
        }
    }

    /// Fresh scheduler wiring the default resubmission function over the
    /// given transmit capability and retry policy.
    #[must_use]
    pub fn with_policy(transmit: Arc<dyn Transmit>, policy: Arc<dyn RetryPolicy>) -> Self {
        Self::new(Box::new(DefaultResubmission::new(transmit, policy)))
    }

    /// Announces a batch of newly pending transactions.
    ///
    /// The batch is unioned into the pending set (existing entries win on
    /// collision) and one send event per announced id is scheduled one
    /// slot ahead, so a tick of the current slot cannot double-emit a
    /// transaction announced mid-tick. Send events carry the blob stored
    /// in the pending set after the union, keeping retransmissions of a
    /// re-announced id coherent with its original announcement.
    pub fn add_pending(&mut self, batch: PendingSet) {
        let announced: Vec<TxId> = batch.ids().collect();
        self.pending.union(batch);

        let mut to_send = Vec::with_capacity(announced.len());
        for id in &announced {
            if let Some(aux) = self.pending.get(id) {
                to_send.push(SendEvent {
                    id: *id,
                    aux: aux.clone(),
                    submissions: SubmissionCount::ZERO,
                });
            }
        }
        trace!(slot = %self.slot, announced = to_send.len(), "pending batch scheduled");
        self.schedule.prepend(self.slot.next(), EventBucket::sends(to_send));
    }

    /// Removes `ids` from the pending set.
    ///
    /// Idempotent; unknown ids are ignored. The schedule is not pruned:
    /// stale send events are filtered lazily during the next tick.
    pub fn rem_pending(&mut self, ids: impl IntoIterator<Item = TxId>) {
        self.pending.difference(ids);
        trace!(remaining = self.pending.len(), "pending ids removed");
    }

    /// Processes the current slot and advances the clock by one.
    ///
    /// The events due now (including any overdue leftovers) and the
    /// nursery are filtered against the pending set, topologically sorted
    /// by blob dependencies, and partitioned into a ready list handed to
    /// the resubmission function and a deferred list that becomes the new
    /// nursery. Confirmation probes due now evict ids that are still
    /// pending; the evicted set is returned.
    ///
    /// Candidates are collected and sorted *before* any state mutation, so
    /// an `Err` leaves the scheduler unchanged: no transmission happens, no
    /// bucket is lost, and the slot does not advance.
    pub fn tick(&mut self) -> Result<BTreeSet<TxId>, SchedulerError> {
        let slot = self.slot;

        let candidates: Vec<SendEvent> = self
            .schedule
            .peek_due(slot)
            .flat_map(|bucket| bucket.to_send.iter())
            .chain(self.schedule.nursery().iter())
            .filter(|event| self.pending.contains(&event.id))
            .cloned()
            .collect();
        let ordered = topological_order(candidates)?;

        // Commit point: drain the due buckets and consume the nursery.
        let bucket = self.schedule.pop(slot);
        let (ready, deferred) = partition_sendable(ordered, &self.pending);
        let transmitted = ready.len();
        let parked = deferred.len();
        self.schedule.set_nursery(deferred);

        let schedule = mem::take(&mut self.schedule);
        self.schedule = self.resubmission.resubmit(slot, ready, schedule);

        let mut evicted = BTreeSet::new();
        for probe in &bucket.to_confirm {
            if self.pending.contains(&probe.id) {
                evicted.insert(probe.id);
            }
        }
        self.pending.difference(evicted.iter().copied());
        self.slot = slot.next();

        debug!(
            %slot,
            transmitted,
            parked,
            evicted = evicted.len(),
            "tick complete"
        );
        Ok(evicted)
    }

    /// Transactions currently known as unconfirmed.
    #[must_use]
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Outstanding obligations: scheduled buckets plus the nursery.
    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The slot the next tick will process.
    #[must_use]
    pub fn current_slot(&self) -> Slot {
        self.slot
    }

    /// The installed resubmission function.
    #[must_use]
    pub fn resubmission(&self) -> &dyn Resubmission {
        self.resubmission.as_ref()
    }

    /// Splices extra events into the schedule at `slot`.
    ///
    /// An escape hatch for hosts and resubmission functions that install
    /// their own probes or reshuffle obligations; equivalent to a single
    /// prepend of the given events.
    pub fn add_to_schedule(
        &mut self,
        slot: Slot,
        sends: Vec<SendEvent>,
        confirms: Vec<ConfirmEvent>,
    ) {
        self.schedule.prepend(
            slot,
            EventBucket {
                to_send: sends,
                to_confirm: confirms,
            },
        );
    }
}
