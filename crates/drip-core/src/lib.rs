// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! drip-core: deterministic slot-driven transaction submission engine.
//!
//! A wallet announces locally originated transactions as *pending*; the
//! scheduler retransmits them on a bounded retry budget, holds descendants
//! back until their in-flight ancestors have gone out, and evicts
//! transactions that a confirmation probe finds still unadopted. The
//! scheduler performs no I/O of its own: broadcasting is an injected
//! capability ([`Transmit`]) and the host drives the clock one slot per
//! [`Scheduler::tick`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod gating;
mod ident;
mod payload;
mod pending;
mod policy;
mod resubmit;
mod schedule;
mod scheduler;
mod slot;

// Re-exports for stable public API
/// Identifier types and the label-derived id constructor.
pub use ident::{make_tx_id, Hash, TxId};
/// Transaction blobs and their consumed inputs.
pub use payload::{TxAux, TxInput};
/// The pending transaction set.
pub use pending::PendingSet;
/// Retry policies mapping submission counts to the next scheduled event.
pub use policy::{ConstantRetry, ExponentialBackoff, NextEvent, RetryPolicy};
/// Transmit capability and resubmission functions.
pub use resubmit::{DefaultResubmission, NullTransmit, Resubmission, Transmit};
/// Schedule, buckets, and the events they carry.
pub use schedule::{ConfirmEvent, EventBucket, Schedule, SendEvent, SubmissionCount};
/// The scheduler core and its error surface.
pub use scheduler::{Scheduler, SchedulerError};
/// The slot clock.
pub use slot::Slot;
