//! RUAG attendance server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `RUAG__*` environment variables, opens the SQLite store, starts the kiosk
//! token rotation and serves the JSON API over HTTP.
//!
//! # Kiosk token
//!
//! To print the token a kiosk would display right now:
//!
//! ```text
//! cargo run -p ruag-api --bin server -- --print-token
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use ruag_api::{AppState, ServerConfig};
use ruag_attendance::{events::AttendanceEvent, kiosk::KioskToken};
use ruag_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "RUAG attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the current kiosk token and exit.
  #[arg(long)]
  print_token: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("RUAG")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if cli.print_token {
    println!("{}", KioskToken::at(&server_cfg.codec(), Utc::now()).token);
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store), &server_cfg)
    .context("invalid attendance policy")?;
  tokio::spawn(log_events(state.flow.events().subscribe()));

  tracing::info!(
    office_lat = server_cfg.policy.office.latitude,
    office_lon = server_cfg.policy.office.longitude,
    radius_m = server_cfg.policy.radius_m,
    on_time_until = %server_cfg.policy.on_time_until,
    "attendance policy loaded"
  );

  let app = ruag_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Mirror the attendance feed into the log.
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<AttendanceEvent>) {
  loop {
    match rx.recv().await {
      Ok(AttendanceEvent::CheckedIn { record }) => tracing::info!(
        person_id = %record.person_id,
        area = %record.area,
        status = %record.check_in_status,
        "feed: check-in"
      ),
      Ok(AttendanceEvent::CheckedOut { record, remote }) => tracing::info!(
        person_id = %record.person_id,
        remote,
        "feed: check-out"
      ),
      Ok(AttendanceEvent::AchievementUnlocked { unlock }) => tracing::info!(
        person_id = %unlock.person_id,
        achievement = %unlock.achievement_id,
        "feed: achievement"
      ),
      Err(RecvError::Lagged(skipped)) => {
        tracing::warn!(skipped, "event log fell behind");
      }
      Err(RecvError::Closed) => break,
    }
  }
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
