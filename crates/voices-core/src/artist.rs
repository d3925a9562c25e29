//! Artist identities as published by the external roster service.

use serde::{Deserialize, Serialize};

/// A known performer or resident host.
///
/// `username` is the stable key on the roster service and the value
/// subscribers follow; `name` is only used for matching and display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistIdentity {
  pub name:     String,
  pub username: String,
}

impl ArtistIdentity {
  pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
    Self { name: name.into(), username: username.into() }
  }
}
