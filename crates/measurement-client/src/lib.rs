//! Tracking client owned by the hosting application.
//!
//! [`MeasurementClient`] ties together the session state machine, the
//! Measurement Protocol URI builder, the background requester and a state
//! store. The host constructs one per application run, calls
//! [`MeasurementClient::start`], tracks activities, and calls
//! [`MeasurementClient::stop`] on shutdown so unsent requests and session
//! state are persisted for the next run.

mod builder;
mod client;
mod error;

pub use builder::ClientBuilder;
pub use client::MeasurementClient;
pub use error::{ClientError, ClientResult};
