//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use voices_core::subscriber::SubscriberRecord;

use crate::Result;

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// A subscriber row plus its tokens and subscriptions, as read from SQLite.
pub struct RawSubscriber {
  pub subscriber_id:         String,
  pub notifications_enabled: bool,
  pub device_tokens:         Vec<String>,
  pub subscribed_artists:    Vec<String>,
}

impl RawSubscriber {
  pub fn into_record(self) -> Result<SubscriberRecord> {
    Ok(SubscriberRecord {
      subscriber_id:         Uuid::parse_str(&self.subscriber_id)?,
      device_tokens:         self.device_tokens,
      subscribed_artists:    self.subscribed_artists.into_iter().collect(),
      notifications_enabled: self.notifications_enabled,
    })
  }
}
