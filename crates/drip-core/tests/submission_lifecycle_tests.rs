// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::collections::BTreeSet;
use std::sync::Arc;

use drip_core::{ConstantRetry, Scheduler, Slot, SubmissionCount, Transmit, TxId};
use drip_dry_tests::{coinbase, pending_of, RecordingTransmit};

fn constant_scheduler(skip: i64, max_retries: u32) -> (Arc<RecordingTransmit>, Scheduler) {
    let transmit = Arc::new(RecordingTransmit::new());
    let scheduler = Scheduler::with_policy(
        Arc::clone(&transmit) as Arc<dyn Transmit>,
        Arc::new(ConstantRetry::new(skip, max_retries)),
    );
    (transmit, scheduler)
}

#[test]
fn zero_skip_retries_in_consecutive_slots_then_evicts() {
    let (transmit, mut scheduler) = constant_scheduler(0, 3);
    let (a_id, a) = coinbase("a");
    scheduler.add_pending(pending_of(&[(a_id, a)]));

    let mut evictions: Vec<BTreeSet<TxId>> = Vec::new();
    for _ in 0..=4 {
        evictions.push(scheduler.tick().unwrap());
    }

    // Transmitted in slots 1, 2, and 3; given up and evicted in slot 4.
    assert_eq!(transmit.batch_ids(), vec![vec![a_id]; 3]);
    assert!(evictions[..4].iter().all(BTreeSet::is_empty));
    assert_eq!(evictions[4], BTreeSet::from([a_id]));
    assert!(scheduler.pending().is_empty());
    assert_eq!(scheduler.current_slot(), Slot::from_raw(5));
}

#[test]
fn constant_retry_makes_exactly_budget_many_calls_then_evicts() {
    let budget = 4u32;
    let (transmit, mut scheduler) = constant_scheduler(1, budget);
    let (t_id, t) = coinbase("t");
    scheduler.add_pending(pending_of(&[(t_id, t)]));

    // Slot 0 carries nothing; the announcement lands at slot 1.
    assert!(scheduler.tick().unwrap().is_empty());
    for _ in 0..budget {
        assert!(scheduler.tick().unwrap().is_empty());
    }
    assert_eq!(transmit.call_count(), budget as usize);
    assert!(transmit.batch_ids().iter().all(|batch| batch == &vec![t_id]));

    let evicted = scheduler.tick().unwrap();
    assert_eq!(evicted, BTreeSet::from([t_id]));
    assert!(scheduler.pending().is_empty());
    assert_eq!(transmit.call_count(), budget as usize);
}

#[test]
fn removal_before_any_tick_silently_drops_the_scheduled_send() {
    let (transmit, mut scheduler) = constant_scheduler(0, 3);
    let (a_id, a) = coinbase("a");
    scheduler.add_pending(pending_of(&[(a_id, a)]));
    scheduler.rem_pending([a_id]);
    assert!(scheduler.pending().is_empty());

    scheduler.tick().unwrap();
    // Slot 1: the stale send event is filtered, not transmitted.
    scheduler.tick().unwrap();
    assert_eq!(transmit.call_count(), 0);
    assert!(scheduler.pending().is_empty());
}

#[test]
fn rem_pending_is_idempotent_and_inverts_add_pending() {
    let (_, mut scheduler) = constant_scheduler(0, 3);
    let (a_id, a) = coinbase("a");
    let (b_id, b) = coinbase("b");
    scheduler.add_pending(pending_of(&[(a_id, a)]));
    let baseline = scheduler.pending().clone();

    scheduler.add_pending(pending_of(&[(b_id, b)]));
    scheduler.rem_pending([b_id]);
    scheduler.rem_pending([b_id]);
    assert_eq!(scheduler.pending(), &baseline);
}

#[test]
fn read_views_observe_without_mutating() {
    let (_, mut scheduler) = constant_scheduler(2, 3);
    assert_eq!(scheduler.current_slot(), Slot::ZERO);
    assert!(scheduler.pending().is_empty());
    assert!(scheduler.schedule().is_empty());

    let (a_id, a) = coinbase("a");
    scheduler.add_pending(pending_of(&[(a_id, a)]));

    let snapshot = scheduler.schedule().clone();
    assert_eq!(scheduler.schedule(), &snapshot);
    assert_eq!(scheduler.pending().len(), 1);
    let bucket = scheduler.schedule().bucket(Slot::from_raw(1)).cloned().unwrap();
    assert_eq!(bucket.to_send[0].submissions, SubmissionCount::ZERO);
    assert!(scheduler.schedule().nursery().is_empty());
}
