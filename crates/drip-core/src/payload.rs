// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transaction blobs and their consumed inputs.

use bytes::Bytes;

use crate::ident::TxId;

/// A single consumed outpoint of a transaction.
///
/// Dependency analysis only cares about which pending transaction (if any)
/// produced the consumed output; inputs whose provenance the wallet cannot
/// resolve are marked [`TxInput::Unknown`] and ignored by gating.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TxInput {
    /// Spends output `index` of the transaction `source`.
    Spend {
        /// Producing transaction.
        source: TxId,
        /// Output index within the producing transaction.
        index: u32,
    },
    /// Provenance unresolved; never participates in dependency gating.
    Unknown,
}

/// Opaque transaction payload plus its inspectable consumed inputs.
///
/// The payload is whatever the wallet serialized for broadcast; the
/// scheduler forwards it untouched to the transmit capability. Cloning is
/// cheap: `Bytes` is reference-counted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxAux {
    payload: Bytes,
    inputs: Vec<TxInput>,
}

impl TxAux {
    /// Wraps serialized payload bytes together with the consumed inputs.
    #[must_use]
    pub fn new(payload: Bytes, inputs: Vec<TxInput>) -> Self {
        Self { payload, inputs }
    }

    /// Serialized bytes handed to the transmit capability.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// All consumed inputs, unknown ones included.
    #[must_use]
    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    /// Ids of the transactions whose outputs this blob consumes.
    ///
    /// [`TxInput::Unknown`] inputs are skipped; a source appearing in
    /// several inputs is yielded once per appearance.
    pub fn parents(&self) -> impl Iterator<Item = TxId> + '_ {
        self.inputs.iter().filter_map(|input| match input {
            TxInput::Spend { source, .. } => Some(*source),
            TxInput::Unknown => None,
        })
    }
}
