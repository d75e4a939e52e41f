// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The pending transaction set.

use std::collections::BTreeMap;

use crate::ident::TxId;
use crate::payload::TxAux;

/// Transactions known locally as unconfirmed, keyed by id.
///
/// Iteration order is id order; the initial scheduling of a batch and the
/// test suite both rely on it being deterministic.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct PendingSet {
    txs: BTreeMap<TxId, TxAux>,
}

impl PendingSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Whether no transaction is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Left-biased union: entries already present win on id collision.
    pub fn union(&mut self, other: PendingSet) {
        for (id, aux) in other.txs {
            self.txs.entry(id).or_insert(aux);
        }
    }

    /// Removes the listed ids; missing ids are silently ignored.
    pub fn difference(&mut self, ids: impl IntoIterator<Item = TxId>) {
        for id in ids {
            self.txs.remove(&id);
        }
    }

    /// Whether `id` is pending.
    #[must_use]
    pub fn contains(&self, id: &TxId) -> bool {
        self.txs.contains_key(id)
    }

    /// The blob announced for `id`, if still pending.
    #[must_use]
    pub fn get(&self, id: &TxId) -> Option<&TxAux> {
        self.txs.get(id)
    }

    /// Id-ordered iteration over all pending entries.
    pub fn iter(&self) -> impl Iterator<Item = (&TxId, &TxAux)> {
        self.txs.iter()
    }

    /// Id-ordered iteration over the pending ids.
    pub fn ids(&self) -> impl Iterator<Item = TxId> + '_ {
        self.txs.keys().copied()
    }
}

impl FromIterator<(TxId, TxAux)> for PendingSet {
    fn from_iter<I: IntoIterator<Item = (TxId, TxAux)>>(iter: I) -> Self {
        Self {
            txs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::ident::make_tx_id;

    fn blob(label: &str) -> TxAux {
        TxAux::new(Bytes::copy_from_slice(label.as_bytes()), Vec::new())
    }

    #[test]
    fn union_is_left_biased() {
        let id = make_tx_id("t");
        let mut left: PendingSet = [(id, blob("original"))].into_iter().collect();
        let right: PendingSet = [(id, blob("replacement"))].into_iter().collect();
        left.union(right);
        assert_eq!(left.len(), 1);
        assert_eq!(left.get(&id), Some(&blob("original")));
    }

    #[test]
    fn difference_ignores_missing_ids() {
        let id = make_tx_id("t");
        let mut set: PendingSet = [(id, blob("t"))].into_iter().collect();
        set.difference([make_tx_id("absent")]);
        assert!(set.contains(&id));
        set.difference([id, make_tx_id("absent")]);
        assert!(set.is_empty());
    }

    #[test]
    fn iteration_is_id_ordered() {
        let mut ids: Vec<TxId> = ["c", "a", "b"].iter().map(|l| make_tx_id(l)).collect();
        let set: PendingSet = ids.iter().map(|&id| (id, blob("x"))).collect();
        ids.sort_unstable();
        let observed: Vec<TxId> = set.ids().collect();
        assert_eq!(observed, ids);
    }
}
