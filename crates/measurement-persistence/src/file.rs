//! JSON files under the measurement base directory.

use crate::{PersistenceError, PersistenceResult, StateStore};
use measurement_config_and_utils::Paths;
use measurement_session::SessionState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::Url;

/// Stores session state and unsent requests as two JSON files.
///
/// Writes go to a temporary sibling that is synced and renamed over the
/// target, so a crash mid-write leaves the previous file intact. An
/// unreadable file is logged and treated as missing.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    session_state_file: PathBuf,
    unsent_requests_file: PathBuf,
}

impl JsonFileStore {
    pub fn new(paths: &Paths) -> Self {
        Self::with_files(paths.session_state_file(), paths.unsent_requests_file())
    }

    pub fn with_files(session_state_file: PathBuf, unsent_requests_file: PathBuf) -> Self {
        Self {
            session_state_file,
            unsent_requests_file,
        }
    }

    pub fn session_state_file(&self) -> &Path {
        &self.session_state_file
    }

    pub fn unsent_requests_file(&self) -> &Path {
        &self.unsent_requests_file
    }
}

impl StateStore for JsonFileStore {
    fn load_session_state(&self) -> PersistenceResult<Option<SessionState>> {
        read_json_lenient(&self.session_state_file)
    }

    fn save_session_state(&self, state: &SessionState) -> PersistenceResult<()> {
        write_json(&self.session_state_file, state)?;
        debug!(path = %self.session_state_file.display(), "Saved session state");
        Ok(())
    }

    fn load_unsent_requests(&self) -> PersistenceResult<Vec<Url>> {
        Ok(read_json_lenient(&self.unsent_requests_file)?.unwrap_or_default())
    }

    fn save_unsent_requests(&self, requests: &[Url]) -> PersistenceResult<()> {
        write_json(&self.unsent_requests_file, &requests)?;
        debug!(
            path = %self.unsent_requests_file.display(),
            count = requests.len(),
            "Saved unsent requests"
        );
        Ok(())
    }
}

/// `Ok(None)` when the file is missing or does not parse.
fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> PersistenceResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable state file");
            Ok(None)
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PersistenceResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    atomic_write(path, content.as_bytes())
}

fn atomic_write(path: &Path, content: &[u8]) -> PersistenceResult<()> {
    let invalid = || PersistenceError::InvalidPath(path.to_path_buf());
    let dir = path.parent().ok_or_else(invalid)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(invalid)?;

    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = dir.join(format!(".{file_name}.tmp.{nanos}"));

    let result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Ok(parent) = fs::File::open(dir) {
            let _ = parent.sync_all();
        }
        Ok(())
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use measurement_session::{SessionStatus, VisitorStatus};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_state() -> SessionState {
        SessionState {
            visitor_id: Uuid::new_v4(),
            first_visit_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            session_started_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            session_number: 4,
            session_hit_count: 17,
            previous_session_started_at: Some(Utc.with_ymd_and_hms(2024, 2, 28, 8, 0, 0).unwrap()),
            last_activity_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 12, 30).unwrap()),
            referrer: Some(Url::parse("https://app.test/settings").unwrap()),
            session_status: SessionStatus::Active,
            visitor_status: VisitorStatus::OptedOut,
        }
    }

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(&Paths::with_base_dir(dir.to_path_buf()))
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.load_session_state().unwrap().is_none());
        assert!(store.load_unsent_requests().unwrap().is_empty());
    }

    #[test]
    fn session_state_survives_a_reopen() {
        let dir = tempdir().unwrap();
        let state = sample_state();
        store_in(dir.path()).save_session_state(&state).unwrap();

        let loaded = store_in(dir.path()).load_session_state().unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn unsent_requests_keep_their_order() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let requests: Vec<Url> = (0..3)
            .map(|i| Url::parse(&format!("https://collect.test/collect?v=1&z={i}")).unwrap())
            .collect();

        store.save_unsent_requests(&requests).unwrap();
        assert_eq!(store.load_unsent_requests().unwrap(), requests);

        store.save_unsent_requests(&[]).unwrap();
        assert!(store.load_unsent_requests().unwrap().is_empty());
    }

    #[test]
    fn corrupt_state_file_is_treated_as_missing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.session_state_file(), "{ not json").unwrap();

        assert!(store.load_session_state().unwrap().is_none());

        store.save_session_state(&sample_state()).unwrap();
        assert!(store.load_session_state().unwrap().is_some());
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = store_in(&nested);

        store.save_session_state(&sample_state()).unwrap();
        assert!(store.session_state_file().exists());
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save_session_state(&sample_state()).unwrap();
        store.save_session_state(&sample_state()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["session-state.json".to_string()]);
    }

    #[test]
    fn state_file_is_camel_case_json() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save_session_state(&sample_state()).unwrap();

        let raw = fs::read_to_string(store.session_state_file()).unwrap();
        assert!(raw.contains("\"visitorId\""));
        assert!(raw.contains("\"sessionHitCount\": 17"));
        assert!(raw.contains("\"visitorStatus\": \"opted_out\""));
    }
}
