//! Onboard - terminal front end for employee onboarding and personal to-dos.
//!
//! Sign up, sign in, keep your profile current and manage a to-do list
//! against the employee backend.

mod commands;
mod prompt;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use onboard_core::auth::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionSnapshot,
};
use onboard_core::config::APP_NAME;
use onboard_core::{App, Config};

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Employee onboarding and personal to-dos", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides config file and ONBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Write logs to a daily file in the cache directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new employee account and sign in
    Signup,

    /// Sign in with email and password
    Signin {
        /// Account email (defaults to the last one used)
        email: Option<String>,

        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },

    /// Sign out and delete the saved session
    Logout {
        /// Also forget the remembered password for the last email
        #[arg(long)]
        forget: bool,
    },

    /// Show whether a session is active
    Status,

    /// View or edit your employee profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Change your password
    Password,

    /// Manage your to-do list
    #[command(subcommand)]
    Todos(TodoCommand),

    /// List departments, optionally filtered by name
    Departments {
        /// Case-insensitive part of a department name
        query: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Print your profile
    Show,

    /// Update contact details. Prompts for every field when no flag is given.
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },

    /// Upload a profile photo
    UploadPhoto { path: PathBuf },

    /// Upload a resume
    UploadResume { path: PathBuf },
}

#[derive(Subcommand)]
pub enum TodoCommand {
    /// List your tasks
    List,

    /// Add a task
    Add {
        /// What needs doing
        task: String,
        /// Due date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Due time, HH:MM (default: now)
        #[arg(long)]
        time: Option<String>,
    },

    /// Change a task's name or due moment
    Edit {
        id: String,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },

    /// Mark a task done, or not done again
    Toggle { id: String },

    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls the level (default `warn`). With a log directory the
/// output goes to a daily rolling file; the returned guard must be held until
/// exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", APP_NAME));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

/// Print the notice attached to any transition the user should hear about.
/// Ends when the session controller is dropped.
async fn report_session_changes(mut rx: watch::Receiver<SessionSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = *rx.borrow_and_update();
        if let Some(notice) = snapshot.reason.notice() {
            eprintln!("{}", notice);
        }
    }
}

fn credential_store(config: &Config, ephemeral: bool) -> Result<Arc<dyn CredentialStore>> {
    if ephemeral {
        return Ok(Arc::new(MemoryCredentialStore::new()));
    }
    Ok(Arc::new(FileCredentialStore::new(config.data_dir()?)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    let mut runtime = config.clone();
    if let Some(url) = cli.api_url.clone() {
        runtime.api_url = Some(url);
    }

    let log_dir = if cli.log_file {
        Some(config.cache_dir()?)
    } else {
        None
    };
    let guard = init_tracing(log_dir);
    info!(api_url = %runtime.api_url(), ephemeral = cli.ephemeral, "Onboard starting");

    let store = credential_store(&runtime, cli.ephemeral)?;
    let app = App::new(runtime, store)?;
    let watcher = tokio::spawn(report_session_changes(app.session.subscribe()));

    let result = commands::run(cli.command, &app, &mut config).await;

    // Dropping the app closes the session channel so the watcher drains and exits.
    drop(app);
    if let Err(e) = watcher.await {
        warn!(error = %e, "Session watcher ended abnormally");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        drop(guard);
        std::process::exit(1);
    }
    drop(guard);
    Ok(())
}
