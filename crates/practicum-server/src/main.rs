//! practicum-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `PRACTICUM_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.
//!
//! # Provisioning
//!
//! A fresh database has no subjects. Create the first administrator and print
//! its bearer token with:
//!
//! ```text
//! practicum-server --bootstrap-admin "Registry Office"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use practicum_core::{
  store::PortalStore,
  subject::{NewSubject, Role},
};
use practicum_server::{AppState, ServerConfig, auth::issue_token};
use practicum_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Practicum internship review server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an ADMIN subject with this name, print its token and exit.
  #[arg(long, value_name = "NAME", conflicts_with = "issue_token")]
  bootstrap_admin: Option<String>,

  /// Print a fresh token for an existing subject and exit.
  #[arg(long, value_name = "SUBJECT_ID")]
  issue_token: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/practicum/practicum.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PRACTICUM"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper modes: provision a token and exit.
  if let Some(name) = cli.bootstrap_admin {
    let admin = store
      .add_subject(NewSubject::new(name, Role::Admin))
      .await
      .context("failed to create admin subject")?;
    let token = issue_token(&store, admin.subject_id)
      .await
      .context("failed to issue token")?;
    println!("subject_id: {}", admin.subject_id);
    println!("token:      {token}");
    return Ok(());
  }
  if let Some(subject_id) = cli.issue_token {
    store
      .get_subject(subject_id)
      .await
      .context("failed to look up subject")?
      .with_context(|| format!("no subject with id {subject_id}"))?;
    let token = issue_token(&store, subject_id)
      .await
      .context("failed to issue token")?;
    println!("{token}");
    return Ok(());
  }

  let state = AppState::new(Arc::new(store), &server_cfg);
  let app = practicum_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
