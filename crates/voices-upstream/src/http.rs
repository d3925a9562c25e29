use std::time::Duration;

use reqwest::{Client, Response};

use crate::{Error, Result};

/// Per-request timeout for every upstream call.
pub const TIMEOUT: Duration = Duration::from_secs(30);

pub fn client() -> Result<Client> {
  Ok(
    Client::builder()
      .timeout(TIMEOUT)
      .user_agent(concat!("voices/", env!("CARGO_PKG_VERSION")))
      .build()?,
  )
}

pub fn join(base: &str, path: &str) -> String {
  format!("{}{}", base.trim_end_matches('/'), path)
}

/// Turn a non-2xx response into [`Error::Status`].
pub fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    Ok(resp)
  } else {
    Err(Error::Status { url: resp.url().to_string(), status })
  }
}
