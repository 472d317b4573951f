//! Failed-login bookkeeping for sales-rep accounts.
//!
//! The state is two stored fields: a counter of consecutive failures and an
//! optional lock expiry. Reaching [`LoginLockout::MAX_FAILED_ATTEMPTS`] sets
//! the expiry [`LoginLockout::LOCK_MINUTES`] into the future and zeroes the
//! counter. A lock lapses on its own once the expiry is in the past.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Result of recording a failed password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The account is still usable; `remaining` failures are left before it locks.
    AttemptRecorded {
        /// Failures left before a lock.
        remaining: u32,
    },
    /// This failure locked the account.
    Locked {
        /// When the lock lapses.
        until: DateTime<Utc>,
    },
}

/// Lockout state persisted alongside a sales rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLockout {
    /// Consecutive failed password checks since the last success or lock.
    pub failed_attempts: u32,
    /// Lock expiry, if the account has been locked.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginLockout {
    /// Failures that trigger a lock.
    pub const MAX_FAILED_ATTEMPTS: u32 = 5;

    /// Lock length in minutes.
    pub const LOCK_MINUTES: i64 = 30;

    /// Rebuild state from stored columns.
    #[must_use]
    pub const fn new(failed_attempts: u32, locked_until: Option<DateTime<Utc>>) -> Self {
        Self {
            failed_attempts,
            locked_until,
        }
    }

    /// Whether the account is locked at `now`.
    #[must_use]
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Record a failed password check made at `now`.
    ///
    /// Callers must check [`Self::is_locked`] first; a failure while locked
    /// is not counted.
    pub fn register_failure(&mut self, now: DateTime<Utc>) -> FailureOutcome {
        if let Some(until) = self.locked_until.filter(|until| *until > now) {
            return FailureOutcome::Locked { until };
        }

        self.locked_until = None;
        self.failed_attempts = self.failed_attempts.saturating_add(1);

        if self.failed_attempts >= Self::MAX_FAILED_ATTEMPTS {
            let until = now + Duration::minutes(Self::LOCK_MINUTES);
            self.failed_attempts = 0;
            self.locked_until = Some(until);
            FailureOutcome::Locked { until }
        } else {
            FailureOutcome::AttemptRecorded {
                remaining: Self::MAX_FAILED_ATTEMPTS - self.failed_attempts,
            }
        }
    }

    /// Outcome of the failure that produced this state.
    ///
    /// Lets a store apply [`Self::register_failure`] atomically and report
    /// the result from the row it wrote back.
    #[must_use]
    pub fn failure_outcome(&self, now: DateTime<Utc>) -> FailureOutcome {
        match self.locked_until.filter(|until| *until > now) {
            Some(until) => FailureOutcome::Locked { until },
            None => FailureOutcome::AttemptRecorded {
                remaining: Self::MAX_FAILED_ATTEMPTS.saturating_sub(self.failed_attempts),
            },
        }
    }

    /// Record a successful password check. Clears the counter and any lapsed lock.
    pub const fn register_success(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }

    /// Whether the stored state differs from a clean account.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.failed_attempts != 0 || self.locked_until.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"))
    }

    #[test]
    fn test_fifth_failure_locks_for_thirty_minutes() {
        let mut state = LoginLockout::default();
        let now = t0();

        for expected_remaining in (1..=4).rev() {
            assert_eq!(
                state.register_failure(now),
                FailureOutcome::AttemptRecorded {
                    remaining: expected_remaining
                }
            );
            assert!(!state.is_locked(now));
        }

        let until = now + Duration::minutes(30);
        assert_eq!(state.register_failure(now), FailureOutcome::Locked { until });
        assert!(state.is_locked(now));
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn test_failure_outcome_matches_recorded_state() {
        let mut state = LoginLockout::default();
        let now = t0();
        for _ in 0..7 {
            let outcome = state.register_failure(now);
            assert_eq!(state.failure_outcome(now), outcome);
        }
    }

    #[test]
    fn test_lock_lapses_after_window() {
        let mut state = LoginLockout::new(0, Some(t0() + Duration::minutes(30)));
        assert!(state.is_locked(t0() + Duration::minutes(29)));
        assert!(!state.is_locked(t0() + Duration::minutes(30)));

        let later = t0() + Duration::minutes(31);
        assert_eq!(
            state.register_failure(later),
            FailureOutcome::AttemptRecorded { remaining: 4 }
        );
        assert_eq!(state.locked_until, None);
    }

    #[test]
    fn test_failure_while_locked_is_not_counted() {
        let until = t0() + Duration::minutes(10);
        let mut state = LoginLockout::new(0, Some(until));
        assert_eq!(state.register_failure(t0()), FailureOutcome::Locked { until });
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn test_success_resets() {
        let mut state = LoginLockout::new(3, None);
        assert!(state.is_dirty());
        state.register_success();
        assert_eq!(state, LoginLockout::default());
        assert!(!state.is_dirty());
    }
}
