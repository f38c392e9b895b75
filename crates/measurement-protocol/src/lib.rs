//! Measurement Protocol encoding for tracked activities.
//!
//! An [`Activity`] plus the current [`measurement_session::SessionManager`]
//! state is turned into a collector request URI by a [`UriBuilder`]. The
//! resulting URI is opaque to the delivery queue.

mod activity;
mod builder;
mod custom;
mod environment;
mod error;

pub use activity::{Activity, ActivityKind};
pub use builder::{MeasurementUriBuilder, UriBuilder, PROTOCOL_VERSION};
pub use custom::{CustomDimensions, MAX_CUSTOM_INDEX};
pub use environment::{Environment, StaticEnvironment, SystemEnvironment};
pub use error::{ProtocolError, ProtocolResult};
