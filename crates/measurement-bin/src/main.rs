//! Measurement CLI - track activities and inspect persisted tracking state.

mod app;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use measurement_config_and_utils::{init_logging_for_service, Config, Paths};
use measurement_protocol::Activity;
use url::Url;

/// Measurement command-line interface.
#[derive(Parser)]
#[command(name = "measurement")]
#[command(about = "Send analytics hits and manage the local visitor session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for config, state and logs. Defaults to ~/.measurement
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Args)]
struct FlushArgs {
    /// Seconds to wait for delivery before persisting what is left
    #[arg(long, default_value_t = 10)]
    wait_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a page view
    PageView {
        /// Page location
        url: Url,
        /// Page title
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        flush: FlushArgs,
    },
    /// Track an event
    Event {
        category: String,
        action: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        value: Option<i64>,
        #[command(flatten)]
        flush: FlushArgs,
    },
    /// Track an app screen view
    ScreenView {
        name: String,
        #[command(flatten)]
        flush: FlushArgs,
    },
    /// Show the persisted visitor, session and unsent requests
    Status,
    /// End the current session; the next hit starts a new one
    EndSession,
    /// Stop tracking this visitor
    OptOut,
    /// Resume tracking this visitor
    OptIn,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    // Initialize logging
    init_logging_for_service("measurement", &cli.log_level, Some(paths.log_file()));

    let config = Config::load(&paths)?;

    match cli.command {
        Commands::PageView { url, title, flush } => {
            let activity = Activity::page_view(url, title);
            app::track(config, &paths, activity, wait(&flush)).await?;
        }
        Commands::Event {
            category,
            action,
            label,
            value,
            flush,
        } => {
            let activity = Activity::event(category, action, label, value);
            app::track(config, &paths, activity, wait(&flush)).await?;
        }
        Commands::ScreenView { name, flush } => {
            app::track(config, &paths, Activity::screen_view(name), wait(&flush)).await?;
        }
        Commands::Status => app::print_status(&paths)?,
        Commands::EndSession => app::end_session(&config, &paths)?,
        Commands::OptOut => app::set_opted_out(&config, &paths, true)?,
        Commands::OptIn => app::set_opted_out(&config, &paths, false)?,
    }

    Ok(())
}

fn wait(flush: &FlushArgs) -> Duration {
    Duration::from_secs(flush.wait_secs)
}
