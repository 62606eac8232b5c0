use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct AttemptWindow {
    /// Reserved attempts not yet cleared by a success
    attempts: u32,
    locked_until: Option<Instant>,
    last_attempt: Instant,
}

/// In-memory failed-attempt limiter. A key is locked for `cooldown` after
/// `max_attempts` consecutive failures, then starts over.
///
/// Callers reserve an attempt with [`AttemptLimiter::try_acquire`] before
/// doing the check, so parallel attempts count against the same budget.
pub struct AttemptLimiter {
    windows: DashMap<String, AttemptWindow>,
    max_attempts: u32,
    cooldown: Duration,
}

impl AttemptLimiter {
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_attempts: max_attempts.max(1),
            cooldown,
        }
    }

    /// Reserve one attempt. Err with the remaining lock time when the key is
    /// locked or its attempt budget is already taken.
    pub fn try_acquire(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut window = self.windows.entry(key.to_string()).or_insert(AttemptWindow {
            attempts: 0,
            locked_until: None,
            last_attempt: now,
        });

        if let Some(until) = window.locked_until {
            if until > now {
                return Err(until - now);
            }
            window.attempts = 0;
            window.locked_until = None;
        }

        if window.attempts >= self.max_attempts {
            let until = now + self.cooldown;
            window.locked_until = Some(until);
            return Err(self.cooldown);
        }

        window.attempts += 1;
        window.last_attempt = now;
        Ok(())
    }

    /// The reserved attempt failed; returns true when this failure locks the key
    pub fn record_failure(&self, key: &str, now: Instant) -> bool {
        let Some(mut window) = self.windows.get_mut(key) else {
            return false;
        };
        if window.locked_until.is_none() && window.attempts >= self.max_attempts {
            window.locked_until = Some(now + self.cooldown);
            tracing::warn!("{} locked for {:?} after {} failures", key, self.cooldown, window.attempts);
            return true;
        }
        false
    }

    pub fn record_success(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Drop keys whose lock has expired or that have been idle for a cool-down
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| match w.locked_until {
            Some(until) => until > now,
            None => w.last_attempt + self.cooldown > now,
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
