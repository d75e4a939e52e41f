// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Drip crates.
//!
//! Everything here exists so scenario and property tests can observe the
//! scheduler's externally visible behavior: a transmit capability that
//! records its calls, and small builders for transactions with known
//! dependency shapes.
//!
//! Builder convention: a fixture blob carries its label as payload, so a
//! recorded blob maps back to the id produced by
//! [`drip_core::make_tx_id`] for the same label.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

use std::sync::Mutex;

use bytes::Bytes;
use drip_core::{make_tx_id, PendingSet, Transmit, TxAux, TxId, TxInput};

/// Transmit capability that records every batch it is asked to broadcast.
///
/// Share one instance with the scheduler through an [`std::sync::Arc`] and
/// inspect the recorded calls afterwards. A poisoned lock means an earlier
/// test panic; records are silently dropped in that case.
#[derive(Debug, Default)]
pub struct RecordingTransmit {
    calls: Mutex<Vec<Vec<TxAux>>>,
}

impl RecordingTransmit {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transmit calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Every recorded batch, in call order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<TxAux>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Every recorded batch as id lists, relying on the builder convention
    /// that a fixture blob's payload is its label.
    #[must_use]
    pub fn batch_ids(&self) -> Vec<Vec<TxId>> {
        self.batches()
            .iter()
            .map(|batch| {
                batch
                    .iter()
                    .map(|aux| make_tx_id(&String::from_utf8_lossy(aux.payload())))
                    .collect()
            })
            .collect()
    }
}

impl Transmit for RecordingTransmit {
    fn transmit(&self, batch: &[TxAux]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(batch.to_vec());
        }
    }
}

/// A transaction with no resolved inputs (a dependency root).
#[must_use]
pub fn coinbase(label: &str) -> (TxId, TxAux) {
    (
        make_tx_id(label),
        TxAux::new(
            Bytes::copy_from_slice(label.as_bytes()),
            vec![TxInput::Unknown],
        ),
    )
}

/// A transaction spending the first output of each listed parent.
#[must_use]
pub fn spending(label: &str, parents: &[TxId]) -> (TxId, TxAux) {
    let inputs = parents
        .iter()
        .map(|&source| TxInput::Spend { source, index: 0 })
        .collect();
    (
        make_tx_id(label),
        TxAux::new(Bytes::copy_from_slice(label.as_bytes()), inputs),
    )
}

/// Collects `(id, blob)` pairs into a pending set.
#[must_use]
pub fn pending_of(txs: &[(TxId, TxAux)]) -> PendingSet {
    txs.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_batches_map_back_to_ids() {
        let recorder = RecordingTransmit::new();
        let (_, a) = coinbase("a");
        let (a_id, _) = coinbase("a");
        recorder.transmit(&[a]);
        assert_eq!(recorder.call_count(), 1);
        assert_eq!(recorder.batch_ids(), vec![vec![a_id]]);
    }

    #[test]
    fn spending_builders_wire_parent_inputs() {
        let (a_id, _) = coinbase("a");
        let (_, b) = spending("b", &[a_id]);
        let parents: Vec<TxId> = b.parents().collect();
        assert_eq!(parents, vec![a_id]);
    }
}
