//! In-memory record of alerts already sent, keyed by show and artist.
//!
//! Optional. Without it a run relies on the exact-hour partition alone to
//! avoid repeating an alert. Entries expire after a TTL and are never
//! persisted, so a restart forgets them.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug)]
pub struct NotificationLedger {
  ttl:     TimeDelta,
  entries: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl NotificationLedger {
  pub fn new(ttl: TimeDelta) -> Self {
    Self { ttl, entries: Mutex::new(HashMap::new()) }
  }

  /// Whether an alert for `(show_id, artist_username)` was recorded within
  /// the TTL before `now`.
  pub fn contains(
    &self,
    show_id: &str,
    artist_username: &str,
    now: DateTime<Utc>,
  ) -> bool {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries
      .get(&(show_id.to_owned(), artist_username.to_owned()))
      .is_some_and(|at| now - *at < self.ttl)
  }

  /// Record an alert and drop expired entries.
  pub fn record(&self, show_id: &str, artist_username: &str, now: DateTime<Utc>) {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.retain(|_, at| now - *at < self.ttl);
    entries.insert((show_id.to_owned(), artist_username.to_owned()), now);
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn entries_expire_after_ttl() {
    let ledger = NotificationLedger::new(TimeDelta::hours(2));
    let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 13, 55, 0).unwrap();

    ledger.record("42", "djnova", t0);
    assert!(ledger.contains("42", "djnova", t0 + TimeDelta::minutes(30)));
    assert!(!ledger.contains("42", "other", t0));
    assert!(!ledger.contains("43", "djnova", t0));
    assert!(!ledger.contains("42", "djnova", t0 + TimeDelta::hours(2)));
  }

  #[test]
  fn recording_prunes_expired_entries() {
    let ledger = NotificationLedger::new(TimeDelta::hours(1));
    let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 13, 55, 0).unwrap();

    ledger.record("1", "a", t0);
    ledger.record("2", "b", t0 + TimeDelta::hours(3));
    assert_eq!(ledger.len(), 1);
  }
}
