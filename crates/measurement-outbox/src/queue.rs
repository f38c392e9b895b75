//! Pending request queues.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;
use url::Url;

/// Pending requests for one requester.
///
/// Two FIFO queues with a fixed selection rule: `prior` (requests resumed
/// from a previous run) is always drained before `current` (requests added
/// during this run). A request is taken into the in-flight slot while being
/// delivered and only leaves the queue for good once delivery succeeds.
///
/// `push` may be called from any thread while the worker takes requests.
/// Locks are always taken in the order `in_flight`, `prior`, `current`.
#[derive(Debug, Default)]
pub struct RequestQueue {
    prior: Mutex<VecDeque<Url>>,
    current: Mutex<VecDeque<Url>>,
    in_flight: Mutex<Option<Url>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly tracked request.
    pub fn push(&self, uri: Url) {
        self.current.lock().push_back(uri);
    }

    /// Append requests left unsent by a previous run.
    pub fn extend_prior(&self, uris: impl IntoIterator<Item = Url>) {
        let mut prior = self.prior.lock();
        prior.extend(uris);
        debug!(count = prior.len(), "Seeded prior queue");
    }

    /// Move the next request into the in-flight slot and return it.
    ///
    /// Returns the request already in flight, if any, so an unfinished
    /// delivery is never skipped.
    pub fn begin_next(&self) -> Option<Url> {
        let mut in_flight = self.in_flight.lock();
        if let Some(uri) = in_flight.as_ref() {
            return Some(uri.clone());
        }

        let next = self
            .prior
            .lock()
            .pop_front()
            .or_else(|| self.current.lock().pop_front())?;
        *in_flight = Some(next.clone());
        Some(next)
    }

    /// Drop the in-flight request after it was delivered.
    pub fn complete_in_flight(&self) -> Option<Url> {
        self.in_flight.lock().take()
    }

    /// The request currently being delivered.
    pub fn in_flight(&self) -> Option<Url> {
        self.in_flight.lock().clone()
    }

    /// Remove and return everything not yet delivered, in delivery order:
    /// the in-flight request, then `prior`, then `current`.
    pub fn drain_unsent(&self) -> Vec<Url> {
        let mut in_flight = self.in_flight.lock();
        let mut unsent = Vec::new();
        unsent.extend(in_flight.take());
        unsent.extend(self.prior.lock().drain(..));
        unsent.extend(self.current.lock().drain(..));
        unsent
    }

    pub fn prior_len(&self) -> usize {
        self.prior.lock().len()
    }

    pub fn current_len(&self) -> usize {
        self.current.lock().len()
    }

    /// Pending requests, counting the in-flight one.
    ///
    /// Holds the in-flight slot while counting, so a request moving into it
    /// is never missed or counted twice.
    pub fn len(&self) -> usize {
        let in_flight = self.in_flight.lock();
        usize::from(in_flight.is_some()) + self.prior_len() + self.current_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("https://collect.test/{name}")).unwrap()
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = RequestQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.begin_next().is_none());
    }

    #[test]
    fn prior_drains_before_current() {
        let queue = RequestQueue::new();
        queue.push(uri("c"));
        queue.extend_prior([uri("a"), uri("b")]);
        queue.push(uri("d"));

        let mut order = Vec::new();
        while let Some(next) = queue.begin_next() {
            order.push(next.path().to_string());
            queue.complete_in_flight();
        }

        assert_eq!(order, vec!["/a", "/b", "/c", "/d"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn unfinished_request_is_returned_again() {
        let queue = RequestQueue::new();
        queue.push(uri("a"));
        queue.push(uri("b"));

        assert_eq!(queue.begin_next(), Some(uri("a")));
        // Not completed: the same request comes back
        assert_eq!(queue.begin_next(), Some(uri("a")));
        assert_eq!(queue.len(), 2);

        queue.complete_in_flight();
        assert_eq!(queue.begin_next(), Some(uri("b")));
    }

    #[test]
    fn len_counts_in_flight() {
        let queue = RequestQueue::new();
        queue.extend_prior([uri("p")]);
        queue.push(uri("c1"));
        queue.push(uri("c2"));
        assert_eq!(queue.len(), 3);

        queue.begin_next();
        assert_eq!(queue.prior_len(), 0);
        assert_eq!(queue.current_len(), 2);
        assert_eq!(queue.in_flight(), Some(uri("p")));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn drain_unsent_preserves_delivery_order() {
        let queue = RequestQueue::new();
        queue.extend_prior([uri("p1"), uri("p2")]);
        queue.push(uri("c1"));

        queue.begin_next();
        let unsent = queue.drain_unsent();
        assert_eq!(unsent, vec![uri("p1"), uri("p2"), uri("c1")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let queue = RequestQueue::new();
        queue.push(uri("same"));
        queue.push(uri("same"));
        assert_eq!(queue.drain_unsent(), vec![uri("same"), uri("same")]);
    }

    #[test]
    fn concurrent_pushes_are_all_kept() {
        let queue = Arc::new(RequestQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(uri(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 1000);
    }

    #[test]
    fn len_never_rises_while_the_worker_drains() {
        let queue = Arc::new(RequestQueue::new());
        queue.extend_prior((0..500).map(|i| uri(&format!("p-{i}"))));
        for i in 0..500 {
            queue.push(uri(&format!("c-{i}")));
        }

        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                while queue.begin_next().is_some() {
                    queue.complete_in_flight();
                }
            })
        };

        // Only removals happen, so every count is at most the previous one
        let mut last = queue.len();
        while last > 0 {
            let now = queue.len();
            assert!(now <= last, "count rose from {last} to {now}");
            last = now;
        }
        worker.join().unwrap();
        assert!(queue.is_empty());
    }
}
