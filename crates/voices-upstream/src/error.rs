//! Error type for `voices-upstream`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned {status}")]
  Status {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected payload: {0}")]
  Payload(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
