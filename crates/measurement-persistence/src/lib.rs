//! Persistence of session state and the unsent request list across restarts.

mod error;
mod file;
mod memory;

pub use error::{PersistenceError, PersistenceResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use measurement_session::SessionState;
use url::Url;

/// Storage for everything the client needs to resume after a restart.
pub trait StateStore: Send + Sync {
    /// Previously saved session state, if any.
    fn load_session_state(&self) -> PersistenceResult<Option<SessionState>>;

    fn save_session_state(&self, state: &SessionState) -> PersistenceResult<()>;

    /// Requests that were not confirmed sent, oldest first. Empty if none.
    fn load_unsent_requests(&self) -> PersistenceResult<Vec<Url>>;

    fn save_unsent_requests(&self, requests: &[Url]) -> PersistenceResult<()>;
}
