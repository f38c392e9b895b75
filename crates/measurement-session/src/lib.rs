//! Session and visitor state for tracked activity.
//!
//! - [`Visitor`]: one install/user, created once and never changed.
//! - [`Session`]: one bounded period of activity with an atomic hit counter.
//! - [`SessionManager`]: the state machine deciding when sessions start and
//!   end, and whether this visitor is tracked at all.
//! - [`SessionState`]: the serializable snapshot persisted between runs.

mod manager;
mod sampling;
mod session;
mod state;
mod visitor;

pub use manager::SessionManager;
pub use sampling::{random_selector, should_track_this_new_visitor};
pub use session::{Session, SessionStatus};
pub use state::SessionState;
pub use visitor::{Visitor, VisitorStatus};
