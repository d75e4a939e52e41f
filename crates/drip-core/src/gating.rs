// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-tick dependency analysis: topological ordering and the
//! ready/deferred partition.
//!
//! The dependency graph is recomputed from the candidate set on every tick
//! and never persisted; candidates are at most the due buckets plus the
//! nursery, which keeps the state minimal and serialization-free.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::TxId;
use crate::pending::PendingSet;
use crate::schedule::SendEvent;
use crate::scheduler::SchedulerError;

/// Orders `candidates` so every event precedes the events that spend its
/// outputs.
///
/// The dependency relation is computed over the candidate set only: event
/// `a` depends on event `b` iff one of `a`'s resolved inputs names `b`'s
/// id. Ties break toward the earliest candidate index, so equal inputs
/// always yield equal output order. Fails with
/// [`SchedulerError::LoopDetected`] when the candidates contain a
/// dependency cycle.
pub(crate) fn topological_order(
    candidates: Vec<SendEvent>,
) -> Result<Vec<SendEvent>, SchedulerError> {
    let n = candidates.len();

    let mut producers: FxHashMap<TxId, Vec<usize>> = FxHashMap::default();
    for (i, event) in candidates.iter().enumerate() {
        producers.entry(event.id).or_default().push(i);
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree: Vec<usize> = vec![0; n];
    for (i, event) in candidates.iter().enumerate() {
        // Dedupe edges so an input spending several outputs of the same
        // producer counts once against the indegree.
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for parent in event.aux.parents() {
            if let Some(sources) = producers.get(&parent) {
                for &source in sources {
                    if seen.insert(source) {
                        dependents[source].push(i);
                        indegree[i] += 1;
                    }
                }
            }
        }
    }

    // Kahn's algorithm, smallest candidate index first.
    let mut available: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(i, _)| i)
        .collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);
    while let Some(i) = available.pop_first() {
        order.push(i);
        for &dependent in &dependents[i] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                available.insert(dependent);
            }
        }
    }

    if order.len() < n {
        let mut looped: Vec<TxId> = candidates
            .iter()
            .enumerate()
            .filter(|&(i, _)| indegree[i] > 0)
            .map(|(_, event)| event.id)
            .collect();
        looped.sort_unstable();
        looped.dedup();
        return Err(SchedulerError::LoopDetected(looped));
    }

    let mut taken: Vec<Option<SendEvent>> = candidates.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| taken[i].take())
        .collect())
}

/// Splits a topologically ordered candidate list into the events that can
/// transmit this tick and those that must wait in the nursery.
///
/// Walking front to back, an event defers iff one of its resolved inputs
/// is still pending and its producer has not already been admitted during
/// this walk; admitted events join the ready set so ordered descendants
/// can follow within the same tick. Order is preserved in both halves.
pub(crate) fn partition_sendable(
    ordered: Vec<SendEvent>,
    pending: &PendingSet,
) -> (Vec<SendEvent>, Vec<SendEvent>) {
    let mut ready: Vec<SendEvent> = Vec::new();
    let mut deferred: Vec<SendEvent> = Vec::new();
    let mut ready_ids: FxHashSet<TxId> = FxHashSet::default();
    for event in ordered {
        let must_wait = event
            .aux
            .parents()
            .any(|parent| pending.contains(&parent) && !ready_ids.contains(&parent));
        if must_wait {
            deferred.push(event);
        } else {
            ready_ids.insert(event.id);
            ready.push(event);
        }
    }
    (ready, deferred)
}
