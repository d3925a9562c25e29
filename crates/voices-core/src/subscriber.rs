//! Subscriber records and recipient resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artist::ArtistIdentity;

/// A listener who may receive show alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
  pub subscriber_id:         Uuid,
  /// Push addresses in registration order, without duplicates.
  pub device_tokens:         Vec<String>,
  /// Usernames of the artists this subscriber follows.
  pub subscribed_artists:    BTreeSet<String>,
  pub notifications_enabled: bool,
}

impl SubscriberRecord {
  pub fn follows(&self, username: &str) -> bool {
    self.subscribed_artists.contains(username)
  }

  pub fn has_devices(&self) -> bool { !self.device_tokens.is_empty() }
}

/// A subscriber paired with the artist they will be alerted about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient<'a> {
  pub subscriber: &'a SubscriberRecord,
  pub artist:     &'a ArtistIdentity,
}

/// Map `artists` (in priority order) to the subscribers who follow them.
///
/// Each enabled subscriber appears at most once, paired with the first
/// artist in `artists` they follow. Subscribers with notifications disabled
/// never appear, whatever they follow. Subscribers without device tokens
/// are still returned; skipping them is the dispatcher's job.
pub fn resolve_recipients<'a>(
  subscribers: &'a [SubscriberRecord],
  artists: &'a [ArtistIdentity],
) -> Vec<Recipient<'a>> {
  subscribers
    .iter()
    .filter(|subscriber| subscriber.notifications_enabled)
    .filter_map(|subscriber| {
      artists
        .iter()
        .find(|artist| subscriber.follows(&artist.username))
        .map(|artist| Recipient { subscriber, artist })
    })
    .collect()
}
