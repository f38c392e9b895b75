use crate::{PersistenceResult, StateStore};
use measurement_session::SessionState;
use parking_lot::Mutex;
use url::Url;

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    session_state: Mutex<Option<SessionState>>,
    unsent: Mutex<Vec<Url>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(session_state: Option<SessionState>, unsent: Vec<Url>) -> Self {
        Self {
            session_state: Mutex::new(session_state),
            unsent: Mutex::new(unsent),
        }
    }
}

impl StateStore for MemoryStore {
    fn load_session_state(&self) -> PersistenceResult<Option<SessionState>> {
        Ok(self.session_state.lock().clone())
    }

    fn save_session_state(&self, state: &SessionState) -> PersistenceResult<()> {
        *self.session_state.lock() = Some(state.clone());
        Ok(())
    }

    fn load_unsent_requests(&self) -> PersistenceResult<Vec<Url>> {
        Ok(self.unsent.lock().clone())
    }

    fn save_unsent_requests(&self, requests: &[Url]) -> PersistenceResult<()> {
        *self.unsent.lock() = requests.to_vec();
        Ok(())
    }
}
