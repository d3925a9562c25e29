//! Wiring for the Voices server binary: configuration, the live
//! collaborator bundle, and the HTTP application.

pub mod scheduler;

use std::path::PathBuf;

use axum::Router;
use chrono::TimeDelta;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use voices_api::{AppState, AuthConfig};
use voices_core::{
  matcher::MatchConfig,
  notifier::NotifierConfig,
  schedule::parse_timezone,
  source::Collaborators,
};
use voices_store_sqlite::SqliteStore;
use voices_upstream::{
  AirtimeSchedule, ExpoGateway, MixcloudDirectory, airtime, expo, mixcloud,
};

pub use scheduler::HourlyScheduler;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `VOICES_*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                      String,
  pub port:                      u16,
  pub store_path:                PathBuf,
  /// IANA name of the station's timezone.
  pub timezone:                  String,
  /// Minute past each hour at which the scheduler runs a check.
  pub check_minute:              u32,
  pub scheduler_enabled:         bool,
  pub upcoming_tolerance_secs:   u32,
  pub dedup_ttl_secs:            Option<u32>,
  pub match_threshold:           f64,
  pub directory_match_threshold: f64,
  pub schedule_url:              String,
  pub directory_url:             String,
  pub directory_account:         String,
  pub directory_max_pages:       usize,
  pub push_url:                  String,
  pub push_access_token:         Option<String>,
  pub admin_username:            String,
  /// argon2 PHC string. Empty disables the admin endpoints.
  pub admin_password_hash:       String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let matching = MatchConfig::default();
    Self {
      host:                      "127.0.0.1".to_string(),
      port:                      3000,
      store_path:                PathBuf::from("~/.local/share/voices/voices.db"),
      timezone:                  "Europe/London".to_string(),
      check_minute:              scheduler::DEFAULT_MINUTE,
      scheduler_enabled:         true,
      upcoming_tolerance_secs:   0,
      dedup_ttl_secs:            None,
      match_threshold:           matching.threshold,
      directory_match_threshold: matching.directory_threshold,
      schedule_url:              airtime::DEFAULT_BASE_URL.to_string(),
      directory_url:             mixcloud::DEFAULT_BASE_URL.to_string(),
      directory_account:         mixcloud::DEFAULT_ACCOUNT.to_string(),
      directory_max_pages:       mixcloud::DEFAULT_MAX_PAGES,
      push_url:                  expo::DEFAULT_BASE_URL.to_string(),
      push_access_token:         None,
      admin_username:            "admin".to_string(),
      admin_password_hash:       String::new(),
    }
  }
}

impl ServerConfig {
  pub fn notifier_config(&self) -> voices_core::Result<NotifierConfig> {
    Ok(NotifierConfig {
      timezone:           parse_timezone(&self.timezone)?,
      matching:           MatchConfig {
        threshold:           self.match_threshold,
        directory_threshold: self.directory_match_threshold,
      },
      upcoming_tolerance: TimeDelta::seconds(i64::from(self.upcoming_tolerance_secs)),
      dedup_ttl:          self
        .dedup_ttl_secs
        .map(|secs| TimeDelta::seconds(i64::from(secs))),
    })
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: self.admin_password_hash.clone(),
    }
  }
}

// ─── Collaborators ───────────────────────────────────────────────────────────

/// The production collaborator bundle: Airtime, Mixcloud, SQLite and Expo.
pub struct Live {
  schedule:  AirtimeSchedule,
  directory: MixcloudDirectory,
  store:     SqliteStore,
  push:      ExpoGateway,
}

impl Live {
  pub fn new(config: &ServerConfig, store: SqliteStore) -> voices_upstream::Result<Self> {
    let mut push = ExpoGateway::new(&config.push_url)?;
    if let Some(token) = &config.push_access_token {
      push = push.with_access_token(token.clone());
    }

    Ok(Self {
      schedule: AirtimeSchedule::new(config.schedule_url.clone())?,
      directory: MixcloudDirectory::new(
        config.directory_url.clone(),
        config.directory_account.clone(),
        config.directory_max_pages,
      )?,
      store,
      push,
    })
  }
}

impl Collaborators for Live {
  type Schedule = AirtimeSchedule;
  type Directory = MixcloudDirectory;
  type Subscribers = SqliteStore;
  type Push = ExpoGateway;

  fn schedule(&self) -> &AirtimeSchedule { &self.schedule }
  fn directory(&self) -> &MixcloudDirectory { &self.directory }
  fn subscribers(&self) -> &SqliteStore { &self.store }
  fn push(&self) -> &ExpoGateway { &self.push }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The full HTTP application: the API under `/api`, with request tracing.
pub fn app(state: AppState<Live>) -> Router {
  Router::new()
    .nest("/api", voices_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
