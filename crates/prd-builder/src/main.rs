//! CLI entry point for the PRD builder: a composition root that wires the
//! store, provider orchestrator, and clarification engine together and
//! exposes them as subcommands (§1 "primary surface is programmatic/CLI
//! rather than a served API").

mod commands;
mod provider;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prd_config::validation::Validate;
use prd_config::{ApplicationConfig, Profile};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment profile (development|staging|production|test).
    #[arg(long, default_value = "development")]
    profile: String,

    /// Log directory path (defaults to an OS-specific location).
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a new PRD request and run it through the clarification engine.
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        requester_email: Option<String>,
        #[arg(long, value_delimiter = ',')]
        mockup_sources: Vec<Uuid>,
        #[arg(long)]
        preferred_provider: Option<String>,
    },
    /// Resume a request stuck in `clarificationNeeded` with answers.
    Resume {
        request_id: Uuid,
        /// Repeatable `--answer "question=answer"` pairs.
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
    /// Show a request's current status and progress.
    Status { request_id: Uuid },
    /// List known requests, optionally filtered by requester.
    List {
        #[arg(long)]
        requester_id: Option<Uuid>,
    },
    /// Export a generated document to a file.
    Export {
        request_id: Uuid,
        #[arg(long, default_value = "markdown")]
        format: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Register a codebase repository and index it synchronously.
    Index {
        repository_url: String,
        #[arg(long, default_value = "main")]
        branch: String,
        #[arg(long)]
        access_token: Option<String>,
    },
    /// Link a PRD request to an already-indexed codebase project.
    LinkCodebase { request_id: Uuid, codebase_project_id: Uuid },
}

fn parse_answer(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(q, a)| (q.to_string(), a.to_string()))
        .ok_or_else(|| format!("expected 'question=answer', got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_dir = args
        .log_dir
        .map(PathBuf::from)
        .unwrap_or_else(get_default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "prd-builder.log");
    let (file_writer, _file_guard): (NonBlocking, WorkerGuard) = tracing_appender::non_blocking(file_appender);
    let (stderr_writer, _stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());
    let multi_writer = file_writer.and(stderr_writer);

    tracing_subscriber::fmt()
        .json()
        .with_writer(multi_writer)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let profile: Profile = args.profile.parse().unwrap_or_default();
    let config = ApplicationConfig::with_profile(profile);
    config.validate().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let collaborators = wiring::build(&config).await?;

    match args.command {
        Command::Submit {
            title,
            description,
            priority,
            requester_email,
            mockup_sources,
            preferred_provider,
        } => {
            commands::submit(
                &collaborators,
                title,
                description,
                &priority,
                requester_email,
                mockup_sources,
                preferred_provider,
            )
            .await?;
        }
        Command::Resume { request_id, answers } => {
            commands::resume(&collaborators, request_id, answers).await?;
        }
        Command::Status { request_id } => {
            commands::status(&collaborators, request_id).await?;
        }
        Command::List { requester_id } => {
            commands::list(&collaborators, requester_id).await?;
        }
        Command::Export { request_id, format, out_dir } => {
            commands::export(&collaborators, request_id, &format, &out_dir).await?;
        }
        Command::Index { repository_url, branch, access_token } => {
            commands::index(&collaborators, repository_url, branch, access_token).await?;
        }
        Command::LinkCodebase { request_id, codebase_project_id } => {
            commands::link_codebase(&collaborators, request_id, codebase_project_id).await?;
        }
    }

    Ok(())
}

fn get_default_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(local_app_data) = std::env::var_os("LOCALAPPDATA") {
            PathBuf::from(local_app_data).join("prd-builder").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            home.join("Library").join("Logs").join("prd-builder")
        } else {
            PathBuf::from("logs")
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let system_log_dir = std::path::Path::new("/var/log/prd-builder");
        if system_log_dir.exists() && is_writable(system_log_dir) {
            system_log_dir.to_path_buf()
        } else if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("prd-builder").join("logs")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".prd-builder").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn is_writable(path: &std::path::Path) -> bool {
    tempfile::tempfile_in(path).is_ok()
}
