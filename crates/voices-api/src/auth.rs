//! HTTP Basic auth for the admin endpoints.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use voices_core::source::Collaborators;

use crate::{AppState, error::ApiError};

/// Admin credentials accepted by this server instance.
///
/// An empty `password_hash` disables the admin endpoints: every request to
/// them is rejected.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means the request was authenticated.
pub struct Authenticated;

/// The `(username, password)` pair carried by an `Authorization: Basic`
/// header. The scheme name is matched case-insensitively.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, payload) = value.trim().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("basic") {
    return None;
  }

  let pair = String::from_utf8(B64.decode(payload.trim()).ok()?).ok()?;
  let (username, password) = pair.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// Check the `Authorization: Basic` header against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  if config.password_hash.is_empty() {
    return Err(ApiError::Unauthorized);
  }

  let (username, password) = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;
  let stored = PasswordHash::new(&config.password_hash).map_err(|_| ApiError::Unauthorized)?;
  let password_ok = Argon2::default()
    .verify_password(password.as_bytes(), &stored)
    .is_ok();

  if username == config.username && password_ok {
    Ok(())
  } else {
    Err(ApiError::Unauthorized)
  }
}

impl<C: Collaborators> FromRequestParts<AppState<C>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<C>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  use super::*;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig { username: "admin".to_string(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("admin", "secret")), &cfg).is_ok());
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("admin", "wrong")), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn wrong_username() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("root", "secret")), &cfg).is_err());
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    assert!(verify_auth(&headers("Basic !!!not-base64!!!"), &cfg).is_err());
  }

  #[test]
  fn scheme_is_case_insensitive() {
    let cfg = config("secret");
    let lower = basic("admin", "secret").replacen("Basic", "basic", 1);
    assert!(verify_auth(&headers(&lower), &cfg).is_ok());
    assert!(verify_auth(&headers("Bearer abc"), &cfg).is_err());
  }

  #[test]
  fn unconfigured_admin_rejects_everything() {
    let cfg = AuthConfig::default();
    assert!(verify_auth(&headers(&basic("", "")), &cfg).is_err());
  }
}
