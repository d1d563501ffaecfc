//! Client-side login throttle.
//!
//! # Design
//! Five consecutive failures lock the login form for fifteen minutes, and
//! submissions less than a second apart are refused outright. The state lives
//! in the client's own storage, so clearing that storage clears the lock:
//! this shapes user behaviour and nothing more. Brute-force protection is the
//! server's job.
//!
//! Every method takes `now` explicitly; the throttle never reads the clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const LOCKOUT_MINUTES: i64 = 15;
pub const MIN_ATTEMPT_SPACING_MS: i64 = 1_000;

/// Why a login attempt was refused without contacting the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBlock {
    Locked { until: DateTime<Utc>, remaining_secs: i64 },
    TooFast,
}

impl fmt::Display for LoginBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginBlock::Locked { remaining_secs, .. } => {
                let minutes = (remaining_secs + 59) / 60;
                write!(
                    f,
                    "too many failed login attempts; try again in {minutes} minute{}",
                    if minutes == 1 { "" } else { "s" }
                )
            }
            LoginBlock::TooFast => f.write_str("please wait a moment before trying again"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginThrottle {
    attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
}

impl LoginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.attempts
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.locked_until
    }

    /// Admit or refuse an attempt at `now`. An admitted attempt is stamped so
    /// the next one can be spaced against it.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<(), LoginBlock> {
        if let Some(until) = self.locked_until {
            if now < until {
                return Err(LoginBlock::Locked {
                    until,
                    remaining_secs: (until - now).num_seconds().max(1),
                });
            }
            self.attempts = 0;
            self.locked_until = None;
        }

        if let Some(last) = self.last_attempt {
            if now - last < Duration::milliseconds(MIN_ATTEMPT_SPACING_MS) {
                return Err(LoginBlock::TooFast);
            }
        }

        self.last_attempt = Some(now);
        Ok(())
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.attempts += 1;
        if self.attempts >= MAX_FAILED_ATTEMPTS {
            self.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
        }
    }

    pub fn record_success(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn fail_n(throttle: &mut LoginThrottle, n: u32, start: DateTime<Utc>) -> DateTime<Utc> {
        let mut now = start;
        for _ in 0..n {
            throttle.check(now).unwrap();
            throttle.record_failure(now);
            now += Duration::seconds(2);
        }
        now
    }

    #[test]
    fn sixth_attempt_after_five_failures_is_locked() {
        let mut throttle = LoginThrottle::new();
        let now = fail_n(&mut throttle, 5, t0());

        let err = throttle.check(now).unwrap_err();
        assert!(matches!(err, LoginBlock::Locked { .. }));

        let later = now + Duration::minutes(14);
        assert!(matches!(throttle.check(later), Err(LoginBlock::Locked { .. })));
    }

    #[test]
    fn lock_expires_after_fifteen_minutes() {
        let mut throttle = LoginThrottle::new();
        let now = fail_n(&mut throttle, 5, t0());
        let after = now + Duration::minutes(LOCKOUT_MINUTES) + Duration::seconds(1);

        assert!(throttle.check(after).is_ok());
        assert_eq!(throttle.failed_attempts(), 0);
    }

    #[test]
    fn four_failures_do_not_lock() {
        let mut throttle = LoginThrottle::new();
        let now = fail_n(&mut throttle, 4, t0());
        assert!(throttle.check(now).is_ok());
        assert!(throttle.locked_until().is_none());
    }

    #[test]
    fn success_resets_the_counter() {
        let mut throttle = LoginThrottle::new();
        let now = fail_n(&mut throttle, 4, t0());
        throttle.check(now).unwrap();
        throttle.record_success();
        assert_eq!(throttle.failed_attempts(), 0);

        let now = fail_n(&mut throttle, 4, now + Duration::seconds(5));
        assert!(throttle.check(now).is_ok());
    }

    #[test]
    fn rapid_resubmission_is_refused() {
        let mut throttle = LoginThrottle::new();
        throttle.check(t0()).unwrap();
        let err = throttle.check(t0() + Duration::milliseconds(400)).unwrap_err();
        assert_eq!(err, LoginBlock::TooFast);
        assert_eq!(err.to_string(), "please wait a moment before trying again");
        assert!(throttle.check(t0() + Duration::milliseconds(1_000)).is_ok());
    }

    #[test]
    fn locked_message_rounds_minutes_up() {
        let block = LoginBlock::Locked {
            until: t0(),
            remaining_secs: 61,
        };
        assert_eq!(
            block.to_string(),
            "too many failed login attempts; try again in 2 minutes"
        );
    }

    #[test]
    fn state_survives_serialization() {
        let mut throttle = LoginThrottle::new();
        fail_n(&mut throttle, 5, t0());
        let json = serde_json::to_string(&throttle).unwrap();
        let restored: LoginThrottle = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, throttle);
    }
}
