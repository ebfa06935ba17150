use time::{Duration, OffsetDateTime};

use crate::store::UserRecord;

/// Brute-force lockout thresholds. Flat duration, flat attempt count — the
/// counters and wall-clock time are the only inputs.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::minutes(15),
        }
    }
}

impl LockoutPolicy {
    /// A lock is active iff `locked_until` is set and strictly in the
    /// future. Expired locks are never cleared here, only ignored.
    pub fn is_locked(&self, user: &UserRecord, now: OffsetDateTime) -> bool {
        matches!(user.locked_until, Some(until) if until > now)
    }

    /// Bumps the failure counter; reaching `max_attempts` locks the account
    /// for the configured duration.
    pub fn record_failure(&self, user: &mut UserRecord, now: OffsetDateTime) {
        user.failed_attempts += 1;
        if user.failed_attempts as u32 >= self.max_attempts {
            user.locked_until = Some(now + self.lockout);
        }
    }

    /// Successful login: counter back to zero, lock cleared.
    pub fn record_success(&self, user: &mut UserRecord) {
        user.failed_attempts = 0;
        user.locked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            nome: None,
            password_hash: "hash".into(),
            failed_attempts: 0,
            locked_until: None,
            session_token: None,
            session_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn failures_below_threshold_do_not_lock() {
        let policy = LockoutPolicy::default();
        let now = OffsetDateTime::now_utc();
        let mut u = user();
        for expected in 1..5 {
            policy.record_failure(&mut u, now);
            assert_eq!(u.failed_attempts, expected);
            assert!(u.locked_until.is_none());
        }
    }

    #[test]
    fn fifth_failure_locks_for_fifteen_minutes() {
        let policy = LockoutPolicy::default();
        let now = OffsetDateTime::now_utc();
        let mut u = user();
        for _ in 0..5 {
            policy.record_failure(&mut u, now);
        }
        assert_eq!(u.failed_attempts, 5);
        assert_eq!(u.locked_until, Some(now + Duration::minutes(15)));
        assert!(policy.is_locked(&u, now));
    }

    #[test]
    fn lock_expires_by_comparison_only() {
        let policy = LockoutPolicy::default();
        let now = OffsetDateTime::now_utc();
        let mut u = user();
        u.locked_until = Some(now - Duration::seconds(1));
        assert!(!policy.is_locked(&u, now));
        // Still set: expiry is lazy, nothing clears the timestamp.
        assert!(u.locked_until.is_some());
    }

    #[test]
    fn lock_boundary_is_strict() {
        let policy = LockoutPolicy::default();
        let now = OffsetDateTime::now_utc();
        let mut u = user();
        u.locked_until = Some(now);
        assert!(!policy.is_locked(&u, now));
    }

    #[test]
    fn success_resets_counter_and_clears_lock() {
        let policy = LockoutPolicy::default();
        let now = OffsetDateTime::now_utc();
        let mut u = user();
        for _ in 0..5 {
            policy.record_failure(&mut u, now);
        }
        policy.record_success(&mut u);
        assert_eq!(u.failed_attempts, 0);
        assert!(u.locked_until.is_none());
    }
}
