use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One bounded period of activity.
///
/// `started_at` and `number` never change; a new session is a new value.
/// The hit counter is shared by all callers and only ever incremented.
#[derive(Debug)]
pub struct Session {
    started_at: DateTime<Utc>,
    number: u32,
    hit_count: AtomicU64,
}

impl Session {
    /// The first session of a visitor.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_values(started_at, 1, 0)
    }

    /// Rebuild a session from persisted values. `number` is clamped to at least 1.
    pub fn with_values(started_at: DateTime<Utc>, number: u32, hit_count: u64) -> Self {
        Self {
            started_at,
            number: number.max(1),
            hit_count: AtomicU64::new(hit_count),
        }
    }

    /// The session that follows this one.
    pub fn next(&self, started_at: DateTime<Utc>) -> Self {
        Self::with_values(started_at, self.number.saturating_add(1), 0)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::SeqCst)
    }

    /// Record one hit. Returns the new count.
    pub fn hit(&self) -> u64 {
        self.hit_count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Where the current session is in its lifecycle.
///
/// `hit()` moves `Ending -> Starting -> Active`; `end()` forces `Ending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Active,
    Ending,
}

impl SessionStatus {
    /// Status after one more hit.
    pub fn after_hit(self) -> Self {
        match self {
            SessionStatus::Ending => SessionStatus::Starting,
            SessionStatus::Starting | SessionStatus::Active => SessionStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn new_session_starts_at_one_with_no_hits() {
        let session = Session::new(Utc::now());
        assert_eq!(session.number(), 1);
        assert_eq!(session.hit_count(), 0);
    }

    #[test]
    fn with_values_never_produces_session_zero() {
        let session = Session::with_values(Utc::now(), 0, 4);
        assert_eq!(session.number(), 1);
        assert_eq!(session.hit_count(), 4);
    }

    #[test]
    fn next_increments_number_and_resets_hits() {
        let first = Session::with_values(Utc::now(), 3, 12);
        let later = first.started_at() + chrono::Duration::minutes(45);
        let second = first.next(later);
        assert_eq!(second.number(), 4);
        assert_eq!(second.hit_count(), 0);
        assert_eq!(second.started_at(), later);
    }

    #[test]
    fn concurrent_hits_are_not_lost() {
        const THREADS: usize = 5;
        const HITS_PER_THREAD: usize = 5000;

        let session = Arc::new(Session::new(Utc::now()));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for _ in 0..HITS_PER_THREAD {
                        session.hit();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(session.hit_count(), (THREADS * HITS_PER_THREAD) as u64);
    }

    #[test]
    fn status_transitions_on_hit() {
        assert_eq!(SessionStatus::Ending.after_hit(), SessionStatus::Starting);
        assert_eq!(SessionStatus::Starting.after_hit(), SessionStatus::Active);
        assert_eq!(SessionStatus::Active.after_hit(), SessionStatus::Active);
    }
}
