// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Retry policies: pure maps from submission counts to the next event.

use crate::schedule::SubmissionCount;
use crate::slot::Slot;

/// Descriptor for the next scheduled event of a transmitted send.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NextEvent {
    /// Schedule another transmission at the given slot.
    SendIn(Slot),
    /// Give up transmitting; probe for confirmation at the given slot.
    CheckConfirmedIn(Slot),
}

/// A pure, total retry policy.
///
/// `submissions` is the post-increment count: how many times the event has
/// now been transmitted, including the transmission made in the current
/// tick. Implementations must tolerate counts at or beyond their retry
/// budget: the same input always yields [`NextEvent::CheckConfirmedIn`]
/// there, never an error.
pub trait RetryPolicy: Send + Sync {
    /// The next event for an obligation transmitted `submissions` times,
    /// decided at `current_slot`.
    fn next_event(&self, submissions: SubmissionCount, current_slot: Slot) -> NextEvent;
}

/// Retries on a fixed slot stride until the budget is exhausted.
#[derive(Clone, Copy, Debug)]
pub struct ConstantRetry {
    skip: i64,
    max_retries: u32,
}

impl ConstantRetry {
    /// A policy that targets `max(0, skip)` slots ahead and converts to a
    /// confirmation probe once `max_retries` transmissions have been made.
    #[must_use]
    pub const fn new(skip: i64, max_retries: u32) -> Self {
        Self { skip, max_retries }
    }

    fn target(&self, current_slot: Slot) -> Slot {
        // Negative skips clamp to zero before the cast.
        #[allow(clippy::cast_sign_loss)]
        let delta = self.skip.max(0) as u64;
        current_slot.add(delta)
    }
}

impl RetryPolicy for ConstantRetry {
    fn next_event(&self, submissions: SubmissionCount, current_slot: Slot) -> NextEvent {
        let target = self.target(current_slot);
        if submissions.0 < self.max_retries {
            NextEvent::SendIn(target)
        } else {
            NextEvent::CheckConfirmedIn(target)
        }
    }
}

/// Smallest `f64` no `u64` can reach; delays at or above it saturate.
const DELAY_SATURATION: f64 = 18_446_744_073_709_551_616.0; // 2^64

/// Retries with exponentially growing slot delays until the budget is
/// exhausted.
///
/// After the n-th transmission the delay is `floor(base^(n-1))` slots: the
/// first retry waits one slot for any base of at least one, the second
/// waits `floor(base)`, and so on. Delays clamp to a non-negative integer
/// and saturate at the counter range, so degenerate bases (below one,
/// zero, even negative) stay total.
#[derive(Clone, Copy, Debug)]
pub struct ExponentialBackoff {
    base: f64,
    max_retries: u32,
}

impl ExponentialBackoff {
    /// A policy backing off by powers of `base`, converting to a
    /// confirmation probe once `max_retries` transmissions have been made.
    #[must_use]
    pub const fn new(base: f64, max_retries: u32) -> Self {
        Self { base, max_retries }
    }

    /// Deterministic clamped `floor(base^(submissions - 1))`.
    ///
    /// Iterated multiplication keeps the computation bit-stable across
    /// platforms; `libm::floor` avoids platform intrinsics.
    fn delay(&self, submissions: SubmissionCount) -> u64 {
        let exponent = submissions.0.saturating_sub(1);
        let mut power = 1.0_f64;
        for _ in 0..exponent {
            power *= self.base;
            if !power.is_finite() || power >= DELAY_SATURATION {
                return u64::MAX;
            }
        }
        let floored = libm::floor(power);
        if floored <= 0.0 {
            0
        } else if floored >= DELAY_SATURATION {
            u64::MAX
        } else {
            // In (0, 2^64) after the clamps above.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let delay = floored as u64;
            delay
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_event(&self, submissions: SubmissionCount, current_slot: Slot) -> NextEvent {
        let target = current_slot.add(self.delay(submissions));
        if submissions.0 < self.max_retries {
            NextEvent::SendIn(target)
        } else {
            NextEvent::CheckConfirmedIn(target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(n: u32) -> SubmissionCount {
        SubmissionCount(n)
    }

    #[test]
    fn constant_retry_holds_a_fixed_stride() {
        let policy = ConstantRetry::new(2, 3);
        let slot = Slot::from_raw(10);
        assert_eq!(
            policy.next_event(count(1), slot),
            NextEvent::SendIn(Slot::from_raw(12))
        );
        assert_eq!(
            policy.next_event(count(2), slot),
            NextEvent::SendIn(Slot::from_raw(12))
        );
    }

    #[test]
    fn constant_retry_converts_at_the_budget() {
        let policy = ConstantRetry::new(0, 3);
        let slot = Slot::from_raw(7);
        assert_eq!(
            policy.next_event(count(2), slot),
            NextEvent::SendIn(slot)
        );
        assert_eq!(
            policy.next_event(count(3), slot),
            NextEvent::CheckConfirmedIn(slot)
        );
        // Counts beyond the budget never error and never send again.
        assert_eq!(
            policy.next_event(count(200), slot),
            NextEvent::CheckConfirmedIn(slot)
        );
    }

    #[test]
    fn negative_skip_clamps_to_the_current_slot() {
        let policy = ConstantRetry::new(-5, 1);
        let slot = Slot::from_raw(4);
        assert_eq!(
            policy.next_event(count(1), slot),
            NextEvent::CheckConfirmedIn(slot)
        );
    }

    #[test]
    fn backoff_doubles_from_a_single_slot() {
        let policy = ExponentialBackoff::new(2.0, 4);
        let slot = Slot::ZERO;
        let expected = [1, 2, 4, 8];
        for (n, delay) in expected.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let submissions = count(n as u32 + 1);
            let target = Slot::from_raw(*delay);
            let next = policy.next_event(submissions, slot);
            if submissions.0 < 4 {
                assert_eq!(next, NextEvent::SendIn(target));
            } else {
                assert_eq!(next, NextEvent::CheckConfirmedIn(target));
            }
        }
    }

    #[test]
    fn backoff_floors_fractional_bases() {
        let policy = ExponentialBackoff::new(1.5, 10);
        // 1.5^0 = 1, 1.5^1 = 1.5, 1.5^2 = 2.25, 1.5^3 = 3.375
        let expected = [1, 1, 2, 3];
        for (n, delay) in expected.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let submissions = count(n as u32 + 1);
            assert_eq!(
                policy.next_event(submissions, Slot::ZERO),
                NextEvent::SendIn(Slot::from_raw(*delay))
            );
        }
    }

    #[test]
    fn backoff_clamps_degenerate_bases_to_zero() {
        let policy = ExponentialBackoff::new(-3.0, 10);
        // (-3)^1 = -3 floors negative and clamps to a zero delay.
        assert_eq!(
            policy.next_event(count(2), Slot::from_raw(9)),
            NextEvent::SendIn(Slot::from_raw(9))
        );
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = ExponentialBackoff::new(10.0, u32::MAX);
        match policy.next_event(count(400), Slot::ZERO) {
            NextEvent::SendIn(slot) => assert_eq!(slot, Slot::from_raw(u64::MAX)),
            NextEvent::CheckConfirmedIn(_) => unreachable!("budget not exhausted"),
        }
    }
}
