//! Throttle for password-reset requests that name unknown users.
//!
//! Existing users are throttled through the reset ledger. Unknown IDs have
//! no ledger row, so their last request time lives here for one window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;

use foundry_core::auth::{AuthError, check_reset_throttle};

const MAX_TRACKED: u64 = 10_000;

/// In-memory reset throttle keyed by user ID.
#[derive(Clone)]
pub struct ResetThrottle {
    recent: Cache<i32, DateTime<Utc>>,
    window_secs: i64,
}

impl ResetThrottle {
    /// Creates a throttle accepting one request per ID every `window_secs`.
    #[must_use]
    pub fn new(window_secs: i64) -> Self {
        let ttl = u64::try_from(window_secs).unwrap_or(0).max(1);
        let recent = Cache::builder()
            .max_capacity(MAX_TRACKED)
            .time_to_live(Duration::from_secs(ttl))
            .build();

        Self {
            recent,
            window_secs,
        }
    }

    /// Records a request for `user_id` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RateLimited` when the previous request for the
    /// same ID is still inside the window.
    pub fn check(&self, user_id: i32, now: DateTime<Utc>) -> Result<(), AuthError> {
        check_reset_throttle(self.recent.get(&user_id), now, self.window_secs)?;
        self.recent.insert(user_id, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_second_request_inside_window_is_limited() {
        let throttle = ResetThrottle::new(60);
        let now = Utc::now();

        assert!(throttle.check(7, now).is_ok());
        let err = throttle
            .check(7, now + ChronoDuration::seconds(15))
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited { retry_after_secs: 45 }));

        assert!(throttle.check(8, now).is_ok());
        assert!(throttle.check(7, now + ChronoDuration::seconds(61)).is_ok());
    }
}
