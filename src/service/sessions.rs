//! Per-session state that expires after a period without use.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

struct Touched<T> {
    value: T,
    touched: Instant,
}

/// Session id -> state, with the last time each session was used
pub struct SessionMap<T> {
    entries: DashMap<Uuid, Touched<T>>,
}

impl<T> Default for SessionMap<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> SessionMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session state
    pub fn insert(&self, id: Uuid, value: T) {
        self.entries.insert(
            id,
            Touched {
                value,
                touched: Instant::now(),
            },
        );
    }

    /// Mutate the session state, creating it with `init` first if needed
    pub fn update_or_insert_with<R>(
        &self,
        id: Uuid,
        init: impl FnOnce() -> T,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let mut entry = self.entries.entry(id).or_insert_with(|| Touched {
            value: init(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        f(&mut entry.value)
    }

    /// Mutate existing session state; None for unknown sessions
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut entry = self.entries.get_mut(&id)?;
        entry.touched = Instant::now();
        Some(f(&mut entry.value))
    }

    /// Read session state; reading counts as use
    pub fn read<R>(&self, id: Uuid, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.update(id, |value| f(value))
    }

    /// Drop sessions not used within `idle`; returns how many went
    pub fn prune_idle(&self, now: Instant, idle: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.touched + idle > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_sessions_are_pruned_and_active_ones_kept() {
        let sessions: SessionMap<Vec<u32>> = SessionMap::new();
        let (old, fresh) = (Uuid::new_v4(), Uuid::new_v4());
        sessions.update_or_insert_with(old, Vec::new, |v| v.push(1));
        sessions.insert(fresh, vec![2]);

        let idle = Duration::from_secs(60);
        assert_eq!(sessions.prune_idle(Instant::now(), idle), 0);
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions.prune_idle(Instant::now() + Duration::from_secs(61), idle), 2);
        assert!(sessions.is_empty());
        assert_eq!(sessions.read(old, |v| v.len()), None);
    }

    #[test]
    fn update_only_touches_known_sessions() {
        let sessions: SessionMap<u32> = SessionMap::new();
        let id = Uuid::new_v4();
        assert_eq!(sessions.update(id, |v| *v += 1), None);

        let n = sessions.update_or_insert_with(id, || 41, |v| {
            *v += 1;
            *v
        });
        assert_eq!(n, 42);
        assert_eq!(sessions.read(id, |v| *v), Some(42));
    }
}
