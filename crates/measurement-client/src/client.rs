use crate::{ClientBuilder, ClientError, ClientResult};
use measurement_config_and_utils::Config;
use measurement_outbox::BackgroundRequester;
use measurement_persistence::StateStore;
use measurement_protocol::{Activity, MeasurementUriBuilder, UriBuilder};
use measurement_session::{SessionManager, VisitorStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tracks activities for one visitor and delivers them in the background.
pub struct MeasurementClient {
    config: Config,
    session: SessionManager,
    uri_builder: MeasurementUriBuilder,
    requester: BackgroundRequester,
    store: Arc<dyn StateStore>,
    /// Set when the last `stop` could not persist the unsent requests and
    /// put them back in the queue instead. The stored list is stale then.
    unsent_held_in_queue: AtomicBool,
}

impl MeasurementClient {
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: Config,
        session: SessionManager,
        uri_builder: MeasurementUriBuilder,
        requester: BackgroundRequester,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            config,
            session,
            uri_builder,
            requester,
            store,
            unsent_held_in_queue: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Session-scoped custom dimensions and metrics live on the builder.
    pub fn uri_builder(&self) -> &MeasurementUriBuilder {
        &self.uri_builder
    }

    pub fn is_started(&self) -> bool {
        self.requester.is_started()
    }

    /// Start background delivery, resuming requests left unsent by the last run
    /// ahead of anything tracked since.
    pub fn start(&self) -> ClientResult<()> {
        if self.requester.is_started() {
            return Err(ClientError::AlreadyStarted);
        }

        let unsent = if self.unsent_held_in_queue.load(Ordering::SeqCst) {
            None
        } else {
            Some(self.store.load_unsent_requests()?)
        };
        info!(
            resumed = unsent.as_ref().map_or(0, Vec::len),
            pending = self.requester.queue_count(),
            "Starting measurement client"
        );
        self.requester.start(self.config.upload_interval(), unsent)?;
        self.unsent_held_in_queue.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Record an activity and queue it for delivery.
    ///
    /// Returns `false` without recording anything when the visitor is opted
    /// out or sampled out. Activities tracked before `start` are queued and
    /// sent once delivery begins.
    pub fn track(&self, activity: &Activity) -> bool {
        let status = self.session.visitor_status();
        if !status.is_active() {
            debug!(hit_type = activity.hit_type(), visitor_status = ?status, "Dropping activity");
            return false;
        }

        // Roll an idle session first so the request is marked as a session start
        self.session.expire_if_idle();
        let uri = self.uri_builder.build(activity, &self.session);
        self.session.hit();

        if let Some(location) = activity.page_location() {
            self.session.set_referrer(Some(location.clone()));
        }

        debug!(hit_type = activity.hit_type(), "Tracked activity");
        self.requester.add(uri);
        true
    }

    /// Mark the current session as ending; the next activity starts a new one.
    pub fn end_session(&self) {
        self.session.end();
    }

    pub fn start_new_session(&self) {
        self.session.start_new_session();
    }

    /// Opt out of (or back into) tracking. A sampled-out visitor stays sampled out.
    pub fn set_opted_out(&self, opted_out: bool) -> VisitorStatus {
        let status = self.session.set_opted_out(opted_out);
        info!(visitor_status = ?status, "Updated visitor opt-out");
        status
    }

    /// Requests waiting for delivery, including one being sent.
    pub fn queue_count(&self) -> usize {
        self.requester.queue_count()
    }

    /// Persist the current session state.
    pub fn save_state(&self) -> ClientResult<()> {
        self.store.save_session_state(&self.session.get_state())?;
        Ok(())
    }

    /// Stop delivery and persist everything needed to resume.
    ///
    /// Returns the number of requests that were not confirmed sent.
    ///
    /// If the unsent requests cannot be saved they go back in the queue, to
    /// be delivered by the next `start` or saved by the next `stop`, and the
    /// save error is returned. Session state is saved either way.
    pub async fn stop(&self) -> ClientResult<usize> {
        if !self.requester.is_started() {
            return Err(ClientError::NotStarted);
        }

        let unsent = self.requester.stop().await?;
        if let Err(err) = self.store.save_unsent_requests(&unsent) {
            warn!(unsent = unsent.len(), error = %err, "Failed to save unsent requests, keeping them queued");
            self.requester.requeue_unsent(unsent);
            self.unsent_held_in_queue.store(true, Ordering::SeqCst);
            if let Err(state_err) = self.save_state() {
                error!(error = %state_err, "Failed to save session state");
            }
            return Err(err.into());
        }
        self.save_state()?;

        info!(unsent = unsent.len(), "Stopped measurement client");
        Ok(unsent.len())
    }
}
