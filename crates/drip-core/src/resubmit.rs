// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The transmit capability and the default resubmission function.

use std::sync::Arc;

use crate::payload::TxAux;
use crate::policy::{NextEvent, RetryPolicy};
use crate::schedule::{ConfirmEvent, EventBucket, Schedule, SendEvent};
use crate::slot::Slot;

/// Capability that broadcasts a batch of transaction blobs to the network.
///
/// The outcome of a broadcast is deliberately unobservable: peers may drop
/// the batch on the floor, and the blockchain, reported through
/// `rem_pending`, remains the only oracle of adoption.
pub trait Transmit: Send + Sync {
    /// Broadcasts `batch`. Failures are swallowed by the implementation.
    fn transmit(&self, batch: &[TxAux]);
}

/// A transmit capability that discards every batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransmit;

impl Transmit for NullTransmit {
    fn transmit(&self, _batch: &[TxAux]) {}
}

/// Per-tick schedule transformer: transmits the events due at a slot and
/// reinserts their successors into the schedule.
///
/// Implementations must not touch the pending set; a resubmission function
/// is a pure schedule-to-schedule transformer lifted over whatever effect
/// its transmit capability performs.
pub trait Resubmission: Send + Sync {
    /// Processes the send events due at `slot` against `schedule` (from
    /// which the due buckets have already been drained) and returns the
    /// successor schedule.
    fn resubmit(&self, slot: Slot, due: Vec<SendEvent>, schedule: Schedule) -> Schedule;
}

/// The standard resubmission function: one transmit call per non-empty
/// batch, then one retry-policy consultation per event.
pub struct DefaultResubmission {
    transmit: Arc<dyn Transmit>,
    policy: Arc<dyn RetryPolicy>,
}

impl DefaultResubmission {
    /// Composes a transmit capability with a retry policy.
    #[must_use]
    pub fn new(transmit: Arc<dyn Transmit>, policy: Arc<dyn RetryPolicy>) -> Self {
        Self { transmit, policy }
    }
}

impl core::fmt::Debug for DefaultResubmission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DefaultResubmission").finish_non_exhaustive()
    }
}

impl Resubmission for DefaultResubmission {
    fn resubmit(&self, slot: Slot, due: Vec<SendEvent>, mut schedule: Schedule) -> Schedule {
        if due.is_empty() {
            // An empty tick makes no transmit call; hosts count calls.
            return schedule;
        }
        let batch: Vec<TxAux> = due.iter().map(|event| event.aux.clone()).collect();
        self.transmit.transmit(&batch);
        for event in due {
            let submissions = event.submissions.bump();
            match self.policy.next_event(submissions, slot) {
                NextEvent::SendIn(at) => schedule.prepend(
                    at,
                    EventBucket::sends(vec![SendEvent {
                        submissions,
                        ..event
                    }]),
                ),
                NextEvent::CheckConfirmedIn(at) => schedule.prepend(
                    at,
                    EventBucket::confirms(vec![ConfirmEvent { id: event.id }]),
                ),
            }
        }
        schedule
    }
}
