//! Error types for `voices-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("an upcoming-show check is already running")]
  AlreadyRunning,

  #[error("subscriber lookup failed: {0}")]
  Subscribers(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("unknown timezone: {0:?}")]
  UnknownTimezone(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
