//! voices-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `VOICES_*` environment variables, opens the SQLite subscriber store,
//! starts the hourly scheduler, and serves the JSON API.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p voices-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::{net::TcpListener, signal};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use voices_api::AppState;
use voices_core::notifier::Notifier;
use voices_server::{HourlyScheduler, Live, ServerConfig};
use voices_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Voices upcoming-show notifier")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Run a single upcoming-show check and exit without serving.
  #[arg(long)]
  run_once: bool,
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

  if cli.hash_password {
    let password = prompt_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VOICES"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let notifier_cfg = server_cfg
    .notifier_config()
    .context("invalid notifier configuration")?;
  let tz = notifier_cfg.timezone;

  let store_path = resolve_home(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let live = Live::new(&server_cfg, store).context("failed to build upstream clients")?;
  let notifier = Arc::new(Notifier::new(live, notifier_cfg));

  if cli.run_once {
    let report = notifier
      .check_upcoming_shows()
      .await
      .context("upcoming-show check failed")?;
    info!(
      current = report.current_shows,
      upcoming = report.upcoming_shows,
      sent = report.messages_sent(),
      "single check complete"
    );
    return Ok(());
  }

  let scheduler = server_cfg.scheduler_enabled.then(|| {
    info!(minute = server_cfg.check_minute, timezone = tz.name(), "starting hourly scheduler");
    HourlyScheduler::new(server_cfg.check_minute, tz).spawn(Arc::clone(&notifier))
  });

  let app = voices_server::app(AppState::new(notifier, server_cfg.auth_config()));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  if let Some(handle) = scheduler {
    handle.abort();
  }
  info!("Server shutdown complete");
  Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      warn!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
    _ = terminate => info!("Received terminate signal, shutting down"),
  }
}

/// Prompt on stderr and read one line from stdin. Echo is not suppressed.
fn prompt_password() -> anyhow::Result<String> {
  eprint!("Password: ");
  let line = std::io::stdin()
    .lines()
    .next()
    .transpose()
    .context("failed to read password")?;
  line.ok_or_else(|| anyhow::anyhow!("no password given on stdin"))
}

/// Resolve a `~/`-relative store path against `$HOME`.
fn resolve_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
