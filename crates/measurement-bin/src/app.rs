//! Command implementations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use measurement_client::{ClientResult, MeasurementClient};
use measurement_config_and_utils::{Config, Paths};
use measurement_persistence::{JsonFileStore, StateStore};
use measurement_protocol::Activity;
use measurement_session::SessionManager;
use tracing::info;

const FLUSH_POLL: Duration = Duration::from_millis(100);

/// Track one activity, wait up to `wait` for the queue to drain, then
/// persist whatever is still unsent.
pub async fn track(
    config: Config,
    paths: &Paths,
    activity: Activity,
    wait: Duration,
) -> ClientResult<()> {
    let store = Arc::new(JsonFileStore::new(paths));
    let client = MeasurementClient::builder(config).store(store).build()?;

    client.start()?;
    if !client.track(&activity) {
        println!(
            "Visitor is {:?}; {} not tracked",
            client.session().visitor_status(),
            activity.hit_type()
        );
    }

    let deadline = Instant::now() + wait;
    while client.queue_count() > 0 && Instant::now() < deadline {
        tokio::time::sleep(FLUSH_POLL).await;
    }

    let unsent = client.stop().await?;
    if unsent == 0 {
        println!("All requests delivered");
    } else {
        println!("{unsent} request(s) saved for the next run");
    }
    Ok(())
}

pub fn print_status(paths: &Paths) -> ClientResult<()> {
    let store = JsonFileStore::new(paths);
    let unsent = store.load_unsent_requests()?;

    match store.load_session_state()? {
        Some(state) => {
            println!("Visitor:          {}", state.visitor_id);
            println!("First visit:      {}", state.first_visit_at.to_rfc3339());
            println!("Visitor status:   {:?}", state.visitor_status);
            println!("Session:          #{}", state.session_number);
            println!("Session started:  {}", state.session_started_at.to_rfc3339());
            println!("Session status:   {:?}", state.session_status);
            println!("Hits:             {}", state.session_hit_count);
            if let Some(last) = state.last_activity_at {
                println!("Last activity:    {}", last.to_rfc3339());
            }
            if let Some(referrer) = &state.referrer {
                println!("Referrer:         {referrer}");
            }
        }
        None => println!("No visitor state in {}", paths.base_dir().display()),
    }
    println!("Unsent requests:  {}", unsent.len());
    Ok(())
}

pub fn end_session(config: &Config, paths: &Paths) -> ClientResult<()> {
    let store = JsonFileStore::new(paths);
    let Some(state) = store.load_session_state()? else {
        println!("No session to end");
        return Ok(());
    };

    let session = SessionManager::restore(state, config.session_timeout());
    session.end();
    store.save_session_state(&session.get_state())?;

    info!(session_number = session.session().number(), "Ended session");
    println!("Session #{} ended", session.session().number());
    Ok(())
}

pub fn set_opted_out(config: &Config, paths: &Paths, opted_out: bool) -> ClientResult<()> {
    let store = JsonFileStore::new(paths);
    let session = match store.load_session_state()? {
        Some(state) => SessionManager::restore(state, config.session_timeout()),
        None => SessionManager::new(config.sample_rate, config.session_timeout()),
    };

    let status = session.set_opted_out(opted_out);
    store.save_session_state(&session.get_state())?;
    println!("Visitor status: {status:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use measurement_session::{SessionStatus, VisitorStatus};
    use tempfile::tempdir;

    fn paths() -> (tempfile::TempDir, Paths) {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn end_session_without_state_is_a_no_op() {
        let (_dir, paths) = paths();
        end_session(&Config::default(), &paths).unwrap();
        assert!(JsonFileStore::new(&paths).load_session_state().unwrap().is_none());
    }

    #[test]
    fn end_session_persists_ending_status() {
        let (_dir, paths) = paths();
        let store = JsonFileStore::new(&paths);
        let session = SessionManager::with_selector(100.0, None, || 0.0);
        session.hit();
        store.save_session_state(&session.get_state()).unwrap();

        end_session(&Config::default(), &paths).unwrap();

        let state = store.load_session_state().unwrap().unwrap();
        assert_eq!(state.session_status, SessionStatus::Ending);
        assert_eq!(state.session_hit_count, 1);
    }

    #[test]
    fn opt_out_creates_and_updates_visitor_state() {
        let (_dir, paths) = paths();
        let config = Config::default();
        let store = JsonFileStore::new(&paths);

        set_opted_out(&config, &paths, true).unwrap();
        let state = store.load_session_state().unwrap().unwrap();
        assert_eq!(state.visitor_status, VisitorStatus::OptedOut);

        set_opted_out(&config, &paths, false).unwrap();
        let restored = store.load_session_state().unwrap().unwrap();
        assert_eq!(restored.visitor_status, VisitorStatus::Active);
        assert_eq!(restored.visitor_id, state.visitor_id);
    }

    #[test]
    fn status_reads_empty_directory() {
        let (_dir, paths) = paths();
        print_status(&paths).unwrap();
    }
}
