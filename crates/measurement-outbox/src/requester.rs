//! Background delivery worker.

use crate::{
    root_cause, AlwaysOnline, ConnectivityProbe, OutboxError, OutboxResult, RequestQueue,
    RetryPolicy, TrackingRequest, Transport,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};
use url::Url;

const WORKER_THREAD_NAME: &str = "measurement-requester";

/// Builder for [`BackgroundRequester`].
pub struct RequesterBuilder {
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    retry: RetryPolicy,
}

impl RequesterBuilder {
    /// Skip uploads while `probe` reports no connectivity.
    pub fn connectivity(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> BackgroundRequester {
        BackgroundRequester {
            queue: Arc::new(RequestQueue::new()),
            transport: self.transport,
            probe: self.probe,
            retry: self.retry,
            worker: Mutex::new(None),
        }
    }
}

/// A running worker thread and its stop signal.
struct Worker {
    cancel: watch::Sender<bool>,
    thread: JoinHandle<()>,
}

/// Delivers queued tracking requests from a dedicated worker thread.
///
/// # Lifecycle
///
/// 1. [`add`](Self::add) requests at any time, from any thread; it never blocks.
/// 2. [`start`](Self::start) the worker, optionally with requests left
///    unsent by a previous run. Those are delivered before anything added.
/// 3. [`stop`](Self::stop) the worker. It returns every request not
///    confirmed delivered, in delivery order, for the caller to persist and
///    pass back to the next `start`.
///
/// Requests are delivered one at a time. A failed request is retried with
/// [`RetryPolicy`] backoff until it succeeds or the worker is stopped; it
/// is never skipped.
pub struct BackgroundRequester {
    queue: Arc<RequestQueue>,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    retry: RetryPolicy,
    worker: Mutex<Option<Worker>>,
}

impl BackgroundRequester {
    /// A requester with the default retry policy and no connectivity check.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<dyn Transport>) -> RequesterBuilder {
        RequesterBuilder {
            transport,
            probe: Arc::new(AlwaysOnline),
            retry: RetryPolicy::default(),
        }
    }

    /// Queue a request for delivery.
    pub fn add(&self, uri: Url) {
        trace!(url = %uri, "Queued tracking request");
        self.queue.push(uri);
    }

    /// Pending requests, including the one being delivered.
    pub fn queue_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_started(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Start the worker.
    ///
    /// `previously_unrequested` is delivered before any request added with
    /// [`add`](Self::add), including ones added before this call.
    pub fn start(
        &self,
        upload_interval: Duration,
        previously_unrequested: Option<Vec<Url>>,
    ) -> OutboxResult<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(OutboxError::AlreadyStarted);
        }

        if let Some(prior) = previously_unrequested {
            self.queue.extend_prior(prior);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let delivery = Delivery {
            queue: Arc::clone(&self.queue),
            transport: Arc::clone(&self.transport),
            probe: Arc::clone(&self.probe),
            retry: self.retry,
            upload_interval,
        };

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || delivery.run_on_own_runtime(cancel_rx))
            .map_err(OutboxError::WorkerSpawn)?;

        *worker = Some(Worker {
            cancel: cancel_tx,
            thread,
        });

        info!(
            upload_interval_ms = upload_interval.as_millis() as u64,
            pending = self.queue.len(),
            "Background requester started"
        );
        Ok(())
    }

    /// Stop the worker and return every request not confirmed delivered.
    ///
    /// Waits for the worker thread to exit, so the queue is no longer touched
    /// by it once this returns. A request that was mid-delivery is included:
    /// its outcome is unknown. The requester can be started again afterwards.
    pub async fn stop(&self) -> OutboxResult<Vec<Url>> {
        let worker = self.worker.lock().take().ok_or(OutboxError::NotStarted)?;
        let _ = worker.cancel.send(true);

        let thread = worker.thread;
        let joined = tokio::task::spawn_blocking(move || thread.join()).await;

        match joined {
            Ok(Ok(())) => {}
            Ok(Err(_)) => error!("Background requester worker panicked"),
            Err(err) => error!(error = %err, "Failed to join background requester worker"),
        }

        let unsent = self.queue.drain_unsent();
        info!(unsent = unsent.len(), "Background requester stopped");
        Ok(unsent)
    }

    /// Put requests back at the front of the queue, ahead of anything added.
    ///
    /// For requests returned by [`stop`](Self::stop) that the caller could
    /// not persist. They are delivered first by the next `start`.
    pub fn requeue_unsent(&self, uris: Vec<Url>) {
        if uris.is_empty() {
            return;
        }
        debug!(count = uris.len(), "Requeued unsent requests");
        self.queue.extend_prior(uris);
    }

    /// Signal the worker to stop without waiting for it. Safe to call repeatedly.
    ///
    /// The worker handle is kept until [`stop`](Self::stop) joins it, so the
    /// requester still counts as started and `start` is rejected meanwhile.
    /// Unsent requests stay queued; `stop` collects them.
    pub fn dispose(&self) {
        if let Some(worker) = self.worker.lock().as_ref() {
            if worker.cancel.send_replace(true) {
                return;
            }
            debug!("Background requester disposed");
        }
    }
}

impl Drop for BackgroundRequester {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Outcome of delivering one request.
#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    Delivered,
    Cancelled,
}

/// Everything the worker thread owns.
struct Delivery {
    queue: Arc<RequestQueue>,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    retry: RetryPolicy,
    upload_interval: Duration,
}

impl Delivery {
    fn run_on_own_runtime(self, cancel: watch::Receiver<bool>) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(error = %err, "Failed to build requester runtime");
                return;
            }
        };
        runtime.block_on(self.run(cancel));
    }

    async fn run(self, mut cancel: watch::Receiver<bool>) {
        debug!("Requester worker running");

        while !is_cancelled(&cancel) {
            if self.probe.is_internet_available() {
                if self.drain(&mut cancel).await == Attempt::Cancelled {
                    break;
                }
            } else {
                debug!(pending = self.queue.len(), "No connectivity, skipping upload");
            }

            if sleep_or_cancel(self.upload_interval, &mut cancel).await {
                break;
            }
        }

        debug!(pending = self.queue.len(), "Requester worker exiting");
    }

    /// Deliver until both queues are empty.
    async fn drain(&self, cancel: &mut watch::Receiver<bool>) -> Attempt {
        loop {
            if is_cancelled(cancel) {
                return Attempt::Cancelled;
            }
            let Some(uri) = self.queue.begin_next() else {
                return Attempt::Delivered;
            };
            if self.request_with_failure_retry(&uri, cancel).await == Attempt::Cancelled {
                return Attempt::Cancelled;
            }
            self.queue.complete_in_flight();
        }
    }

    /// Send `uri` until it succeeds or the worker is cancelled.
    async fn request_with_failure_retry(
        &self,
        uri: &Url,
        cancel: &mut watch::Receiver<bool>,
    ) -> Attempt {
        let request = TrackingRequest::from_uri(uri);
        let mut failures: u32 = 0;

        loop {
            match self.transport.send(&request).await {
                Ok(()) => {
                    debug!(url = %uri, attempts = failures + 1, "Tracking request delivered");
                    return Attempt::Delivered;
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry.delay_after(failures);
                    warn!(
                        url = %uri,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %root_cause(&err),
                        "Send failed, retrying"
                    );
                    if sleep_or_cancel(delay, cancel).await {
                        return Attempt::Cancelled;
                    }
                }
            }
        }
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once cancellation is signalled or the requester is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

/// Sleep for `duration`. Returns true if cancelled first.
async fn sleep_or_cancel(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if is_cancelled(cancel) {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => is_cancelled(cancel),
        _ = cancelled(cancel) => true,
    }
}
