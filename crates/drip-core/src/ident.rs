// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use blake3::Hasher;

/// Canonical 256-bit content hash used to address transactions.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a transaction known to the wallet.
///
/// A `TxId` is an opaque 32-byte content hash. Hosts derive ids from the
/// serialized transaction bytes; tests and fixtures use stable,
/// label-derived ids via [`make_tx_id`] (`blake3("tx:" || label)`). The
/// scheduler never inspects the preimage; ids exist only for equality,
/// ordering, and map keys.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TxId(pub Hash);

impl TxId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl core::fmt::Display for TxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Eight bytes of prefix is plenty for logs; full ids are 64 hex chars.
        write!(f, "{}", hex::encode(&self.0[0..8]))
    }
}

/// Produces a stable, domain-separated transaction identifier (prefix
/// `b"tx:"`) using BLAKE3.
pub fn make_tx_id(label: &str) -> TxId {
    let mut hasher = Hasher::new();
    hasher.update(b"tx:");
    hasher.update(label.as_bytes());
    TxId(hasher.finalize().into())
}
