//! Push messages handed to the delivery gateway, and the per-token tickets
//! it hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  artist::ArtistIdentity, countdown::format_time_until, schedule::ShowEntry,
};

pub const SHOW_ALERT_TITLE: &str = "Upcoming Show Alert";

/// Structured payload delivered alongside the visible notification.
///
/// Serialises as e.g.
/// `{"type":"show_alert","showId":"42","artistUsername":"djnova"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  tag = "type",
  rename_all = "snake_case",
  rename_all_fields = "camelCase"
)]
pub enum PushData {
  ShowAlert { show_id: String, artist_username: String },
  Test { timestamp: DateTime<Utc> },
}

/// One notification addressed to every device of a single subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
  pub tokens: Vec<String>,
  pub title:  String,
  pub body:   String,
  pub data:   PushData,
}

impl PushMessage {
  /// The "artist will be live soon" alert for `show`.
  pub fn show_alert(
    tokens: Vec<String>,
    show: &ShowEntry,
    artist: &ArtistIdentity,
    now: DateTime<Utc>,
  ) -> Self {
    let until = format_time_until(show.starts_at, now);
    Self {
      tokens,
      title: SHOW_ALERT_TITLE.to_owned(),
      body: format!("{} will be live in {until}!", artist.name),
      data: PushData::ShowAlert {
        show_id:         show.id.clone(),
        artist_username: artist.username.clone(),
      },
    }
  }
}

/// What the gateway did with one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
  /// Accepted by the provider; `id` is its receipt identifier, if any.
  Accepted { id: Option<String> },
  Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTicket {
  pub token:   String,
  #[serde(flatten)]
  pub outcome: DeliveryOutcome,
}

impl DeliveryTicket {
  pub fn accepted(token: impl Into<String>, id: Option<String>) -> Self {
    Self { token: token.into(), outcome: DeliveryOutcome::Accepted { id } }
  }

  pub fn rejected(token: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      token:   token.into(),
      outcome: DeliveryOutcome::Rejected { reason: reason.into() },
    }
  }

  pub fn is_accepted(&self) -> bool {
    matches!(self.outcome, DeliveryOutcome::Accepted { .. })
  }
}
