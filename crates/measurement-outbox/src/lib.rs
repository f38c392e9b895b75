//! Reliable background delivery of tracking requests.
//!
//! This crate provides:
//! - [`RequestQueue`]: two FIFO queues, requests resumed from a previous run
//!   (`prior`) drained strictly before newly added ones (`current`)
//! - [`RetryPolicy`]: linear, capped backoff between failed attempts
//! - [`TrackingRequest`]: GET or POST shape of a request URI
//! - [`Transport`] / [`HttpTransport`]: the pluggable send operation
//! - [`BackgroundRequester`]: a dedicated worker that delivers the queue
//!   one request at a time, retrying each until it succeeds, and hands back
//!   everything unsent when stopped

mod error;
mod queue;
mod request;
mod requester;
mod retry;
mod transport;

pub use error::{root_cause, OutboxError, OutboxResult};
pub use queue::RequestQueue;
pub use request::{RequestMethod, TrackingRequest, MAX_GET_URI_LENGTH};
pub use requester::{BackgroundRequester, RequesterBuilder};
pub use retry::{RetryPolicy, DEFAULT_RETRY_CAP, DEFAULT_RETRY_STEP};
pub use transport::{
    AlwaysOnline, ConnectivityProbe, HttpTransport, HttpTransportConfig, Transport,
};
