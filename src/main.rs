//! Hotel booking demo service
//!
//! # Usage
//! ```bash
//! GITHUB_TOKEN=... hotel-booking --owner acme --repo hotel   # GitHub history
//! hotel-booking --provider local --repo-path .               # Local git history
//! hotel-booking --log-file runtime_errors.log                # Also log JSON to a file
//! ```

mod blame;
mod error;
mod history;
mod models;
mod routes;
mod store;

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use clap::{Parser, ValueEnum};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blame::{BlameResolver, ResolverOptions};
use history::github::{GitHubConfig, DEFAULT_API_URL};
use history::{GitHubProvider, LocalGitProvider, SharedProvider};
use routes::{AuthorDefaults, AuthorState};
use store::InMemoryBookingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// GitHub REST API
    Github,
    /// Git repository on disk
    Local,
}

/// Hotel booking demo - bookings plus line author lookup
#[derive(Parser, Debug)]
#[command(name = "hotel-booking")]
#[command(about = "Booking demo service with a commit author lookup", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "HOTEL_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to run the server on
    #[arg(short, long, env = "HOTEL_PORT", default_value = "8081")]
    port: u16,

    /// Where commit history comes from
    #[arg(long, value_enum, env = "HOTEL_PROVIDER", default_value = "github")]
    provider: ProviderKind,

    /// Repository used by the local provider
    #[arg(long, value_name = "PATH", default_value = ".")]
    repo_path: PathBuf,

    /// GitHub token used as a bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub API base url (change for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api_url: String,

    /// Commits requested per history page
    #[arg(long, default_value = "100")]
    per_page: u32,

    /// Pages of history scanned per lookup
    #[arg(long, default_value = "1")]
    max_pages: u32,

    /// Deadline for each history provider call, in seconds
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Default repository owner for /author
    #[arg(long, env = "AUTHOR_OWNER", default_value = "your-repo-owner")]
    owner: String,

    /// Default repository name for /author
    #[arg(long, env = "AUTHOR_REPO", default_value = "your-repo-name")]
    repo: String,

    /// Default file for /author
    #[arg(long, env = "AUTHOR_FILE", default_value = "main.go")]
    file: String,

    /// Default line for /author
    #[arg(long, env = "AUTHOR_LINE", default_value = "42")]
    line: i64,

    /// Directory served for every other path
    #[arg(long, default_value = "./static")]
    static_dir: PathBuf,

    /// Append JSON formatted logs to this file as well
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<File>) {
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}

fn build_provider(cli: &Cli, timeout: Duration) -> anyhow::Result<SharedProvider> {
    let provider: SharedProvider = match cli.provider {
        ProviderKind::Github => Arc::new(
            GitHubProvider::new(GitHubConfig {
                api_url: cli.github_api_url.clone(),
                token: cli.github_token.clone(),
                per_page: cli.per_page,
                timeout,
            })
            .context("Failed to create GitHub client")?,
        ),
        ProviderKind::Local => {
            let local = LocalGitProvider::open(&cli.repo_path, cli.per_page)
                .with_context(|| format!("Failed to open repository {}", cli.repo_path.display()))?;
            tracing::info!(repo = local.path(), "Using local git history");
            Arc::new(local)
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.log_file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?,
        ),
        None => None,
    };
    init_tracing(log_file);

    let timeout = Duration::from_secs(cli.request_timeout_secs.max(1));
    let provider = build_provider(&cli, timeout)?;

    let resolver = BlameResolver::new(
        provider,
        ResolverOptions {
            max_pages: cli.max_pages.max(1),
            call_timeout: timeout,
        },
    );

    let provider_name = resolver.provider_name();
    let author = AuthorState {
        resolver,
        defaults: Arc::new(AuthorDefaults {
            owner: cli.owner.clone(),
            repo: cli.repo.clone(),
            path: cli.file.clone(),
            line: cli.line,
        }),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(Arc::new(InMemoryBookingStore::new()), author))
        .fallback_service(ServeDir::new(&cli.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        %addr,
        provider = provider_name,
        max_pages = cli.max_pages,
        static_dir = %cli.static_dir.display(),
        "Starting server"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
