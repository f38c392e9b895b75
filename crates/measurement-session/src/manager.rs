//! Session lifecycle state machine.

use crate::sampling::{random_selector, should_track_this_new_visitor};
use crate::{Session, SessionState, SessionStatus, Visitor, VisitorStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Fields replaced together when a session rolls over.
#[derive(Debug)]
struct SessionInner {
    session: Arc<Session>,
    status: SessionStatus,
    previous_session_started_at: Option<DateTime<Utc>>,
    last_activity_at: Option<DateTime<Utc>>,
    referrer: Option<Url>,
    visitor_status: VisitorStatus,
}

impl SessionInner {
    fn is_idle_longer_than(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let Some(last_activity) = self.last_activity_at else {
            return false;
        };
        match (now - last_activity).to_std() {
            Ok(idle) => idle > timeout,
            // Clock went backwards
            Err(_) => false,
        }
    }

    fn roll(&mut self, started_at: DateTime<Utc>) {
        let next = self.session.next(started_at);
        self.previous_session_started_at = Some(self.session.started_at());
        self.session = Arc::new(next);
        self.status = SessionStatus::Starting;
    }
}

/// Tracks the visitor, the current session and their statuses.
///
/// All methods take `&self` and are safe to call from many threads. Session
/// rollover happens under one lock so the previous-start time, the session
/// and its status always change together.
#[derive(Debug)]
pub struct SessionManager {
    visitor: Visitor,
    session_timeout: Option<Duration>,
    inner: Mutex<SessionInner>,
}

impl SessionManager {
    /// Create state for a brand-new visitor, sampled with a uniform random draw.
    pub fn new(sample_rate: f64, session_timeout: Option<Duration>) -> Self {
        Self::with_selector(sample_rate, session_timeout, random_selector)
    }

    /// Create state for a brand-new visitor with an explicit sampling selector.
    ///
    /// The sampling decision is made here, once. A sampled-out visitor stays
    /// sampled out for the lifetime of its persisted state.
    pub fn with_selector(
        sample_rate: f64,
        session_timeout: Option<Duration>,
        selector: impl FnOnce() -> f64,
    ) -> Self {
        let now = Utc::now();
        let visitor_status = if should_track_this_new_visitor(sample_rate, selector) {
            VisitorStatus::Active
        } else {
            VisitorStatus::SampledOut
        };
        let visitor = Visitor::new();

        info!(
            visitor_id = %visitor.id(),
            sample_rate,
            visitor_status = ?visitor_status,
            "Created new visitor"
        );

        Self {
            visitor,
            session_timeout,
            inner: Mutex::new(SessionInner {
                session: Arc::new(Session::new(now)),
                status: SessionStatus::Starting,
                previous_session_started_at: None,
                last_activity_at: None,
                referrer: None,
                visitor_status,
            }),
        }
    }

    /// Restore a manager from a persisted snapshot, verbatim.
    pub fn restore(state: SessionState, session_timeout: Option<Duration>) -> Self {
        debug!(
            visitor_id = %state.visitor_id,
            session_number = state.session_number,
            "Restored session state"
        );

        Self {
            visitor: Visitor::with_id(state.visitor_id, state.first_visit_at),
            session_timeout,
            inner: Mutex::new(SessionInner {
                session: Arc::new(Session::with_values(
                    state.session_started_at,
                    state.session_number,
                    state.session_hit_count,
                )),
                status: state.session_status,
                previous_session_started_at: state.previous_session_started_at,
                last_activity_at: state.last_activity_at,
                referrer: state.referrer,
                visitor_status: state.visitor_status,
            }),
        }
    }

    pub fn visitor(&self) -> &Visitor {
        &self.visitor
    }

    /// The current session. Hold the `Arc` only briefly; it is replaced on rollover.
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.inner.lock().session)
    }

    pub fn session_status(&self) -> SessionStatus {
        self.inner.lock().status
    }

    pub fn visitor_status(&self) -> VisitorStatus {
        self.inner.lock().visitor_status
    }

    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout
    }

    pub fn previous_session_started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().previous_session_started_at
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_activity_at
    }

    /// Last page location, sent as the referrer of the next page view.
    pub fn referrer(&self) -> Option<Url> {
        self.inner.lock().referrer.clone()
    }

    pub fn set_referrer(&self, referrer: Option<Url>) {
        self.inner.lock().referrer = referrer;
    }

    /// Opt the visitor out of (or back into) tracking.
    ///
    /// Has no effect on a sampled-out visitor. Returns the resulting status.
    pub fn set_opted_out(&self, opted_out: bool) -> VisitorStatus {
        let mut inner = self.inner.lock();
        if inner.visitor_status != VisitorStatus::SampledOut {
            inner.visitor_status = if opted_out {
                VisitorStatus::OptedOut
            } else {
                VisitorStatus::Active
            };
        }
        inner.visitor_status
    }

    /// Record a hit now.
    pub fn hit(&self) {
        self.hit_at(Utc::now());
    }

    /// Record a hit at `now`.
    ///
    /// Rolls over to a new session first if the timeout has elapsed, then
    /// records the activity time, advances the status and bumps the hit count.
    ///
    /// The count is bumped under the lock so it always lands on the session
    /// the hit was attributed to, even if another thread rolls the session.
    pub fn hit_at(&self, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        self.expire_locked(&mut inner, now);
        inner.last_activity_at = Some(now);
        inner.status = inner.status.after_hit();
        inner.session.hit();
    }

    /// Start a new session now if the current one has been idle past the timeout.
    pub fn expire_if_idle(&self) -> bool {
        self.expire_if_idle_at(Utc::now())
    }

    /// Start a new session at `now` if the current one has been idle past the
    /// timeout. Returns whether a new session was started.
    pub fn expire_if_idle_at(&self, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock();
        self.expire_locked(&mut inner, now)
    }

    fn expire_locked(&self, inner: &mut SessionInner, now: DateTime<Utc>) -> bool {
        let Some(timeout) = self.session_timeout else {
            return false;
        };
        if !inner.is_idle_longer_than(now, timeout) {
            return false;
        }
        inner.roll(now);
        info!(
            session_number = inner.session.number(),
            timeout_secs = timeout.as_secs(),
            "Session timed out, started new session"
        );
        true
    }

    /// Mark the current session as ending. The next hit starts a new one.
    pub fn end(&self) {
        self.inner.lock().status = SessionStatus::Ending;
    }

    /// Replace the current session with a new one starting now.
    pub fn start_new_session(&self) {
        self.start_new_session_at(Utc::now());
    }

    /// Replace the current session with a new one starting at `started_at`.
    pub fn start_new_session_at(&self, started_at: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.roll(started_at);
        info!(session_number = inner.session.number(), "Started new session");
    }

    /// Snapshot everything needed to restore this manager later.
    pub fn get_state(&self) -> SessionState {
        let inner = self.inner.lock();
        SessionState {
            visitor_id: self.visitor.id(),
            first_visit_at: self.visitor.first_visit_at(),
            session_started_at: inner.session.started_at(),
            session_number: inner.session.number(),
            session_hit_count: inner.session.hit_count(),
            previous_session_started_at: inner.previous_session_started_at,
            last_activity_at: inner.last_activity_at,
            referrer: inner.referrer.clone(),
            session_status: inner.status,
            visitor_status: inner.visitor_status,
        }
    }
}
