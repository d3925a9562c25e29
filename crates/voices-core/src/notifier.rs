//! The upcoming-show notifier.
//!
//! One run fetches the schedule, works out which artists go on air at the
//! next top of the hour, drops the ones already on air, and sends a single
//! alert to every subscriber following one of the rest. The notifier keeps
//! no state between runs apart from the optional [`NotificationLedger`].
//!
//! Runs are single-flight: a second call while one is in progress fails with
//! [`Error::AlreadyRunning`] instead of racing it.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  artist::ArtistIdentity,
  ledger::NotificationLedger,
  matcher::{MatchConfig, matches},
  push::{DeliveryTicket, PushMessage},
  schedule::{ShowEntry, fetch_schedule},
  source::{ArtistDirectory, Collaborators, PushGateway, SubscriberDirectory},
  subscriber::{SubscriberRecord, resolve_recipients},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NotifierConfig {
  /// The station's timezone; hour boundaries are taken on its wall clock.
  pub timezone:           Tz,
  pub matching:           MatchConfig,
  /// How far a show's start may sit from the next hour boundary and still
  /// count as upcoming. Zero means exact-instant equality.
  pub upcoming_tolerance: TimeDelta,
  /// Enables the in-memory [`NotificationLedger`] with this TTL.
  pub dedup_ttl:          Option<TimeDelta>,
}

impl Default for NotifierConfig {
  fn default() -> Self {
    Self {
      timezone:           chrono_tz::Europe::London,
      matching:           MatchConfig::default(),
      upcoming_tolerance: TimeDelta::zero(),
      dedup_ttl:          None,
    }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// One alert handed to the push gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
  pub show_id:         String,
  pub artist_username: String,
  pub subscriber_id:   Uuid,
  pub tickets:         Vec<DeliveryTicket>,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub evaluated_at:   DateTime<Utc>,
  pub current_shows:  usize,
  pub upcoming_shows: usize,
  pub dispatches:     Vec<Dispatch>,
}

impl RunReport {
  pub fn messages_sent(&self) -> usize { self.dispatches.len() }
}

// ─── Single-flight guard ─────────────────────────────────────────────────────

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(flag))
  }
}

impl Drop for RunGuard<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

pub struct Notifier<C> {
  collaborators: C,
  config:        NotifierConfig,
  ledger:        Option<NotificationLedger>,
  running:       AtomicBool,
}

impl<C: Collaborators> Notifier<C> {
  pub fn new(collaborators: C, config: NotifierConfig) -> Self {
    let ledger = config.dedup_ttl.map(NotificationLedger::new);
    Self {
      collaborators,
      config,
      ledger,
      running: AtomicBool::new(false),
    }
  }

  pub fn collaborators(&self) -> &C { &self.collaborators }

  pub fn config(&self) -> &NotifierConfig { &self.config }

  /// Whether a run is currently in flight.
  pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }

  /// Run the check at the current instant.
  pub async fn check_upcoming_shows(&self) -> Result<RunReport> {
    self.check_upcoming_shows_at(Utc::now()).await
  }

  /// Run the check as if the clock read `now`.
  ///
  /// Fails if the subscriber lookup fails. Schedule and roster failures
  /// only shrink the run: they are logged and treated as empty.
  pub async fn check_upcoming_shows_at(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RunReport> {
    let _guard = RunGuard::acquire(&self.running).ok_or(Error::AlreadyRunning)?;

    let shows = fetch_schedule(
      self.collaborators.schedule(),
      self.config.timezone,
      now,
      self.config.upcoming_tolerance,
    )
    .await;

    let subscribers = self
      .collaborators
      .subscribers()
      .notifiable_subscribers()
      .await
      .map_err(|e| Error::Subscribers(Box::new(e)))?;

    let mut report = RunReport {
      evaluated_at:   now,
      current_shows:  shows.current.len(),
      upcoming_shows: shows.upcoming.len(),
      dispatches:     Vec::new(),
    };

    for show in &shows.upcoming {
      let dispatches = self
        .notify_show(show, &shows.current, &subscribers, now)
        .await;
      report.dispatches.extend(dispatches);
    }

    info!(
      current = report.current_shows,
      upcoming = report.upcoming_shows,
      sent = report.messages_sent(),
      "upcoming shows check complete"
    );
    Ok(report)
  }

  /// Every roster artist whose name or username matches `show_title`.
  ///
  /// Fetches the roster on every call. A roster failure is logged and
  /// yields no artists.
  pub async fn match_show_to_artists(&self, show_title: &str) -> Vec<ArtistIdentity> {
    let roster = match self.collaborators.directory().list_artists().await {
      Ok(roster) => roster,
      Err(e) => {
        error!(error = %e, show = show_title, "error fetching artist roster");
        return Vec::new();
      }
    };

    let threshold = self.config.matching.directory_threshold;
    roster
      .into_iter()
      .filter(|artist| matches(show_title, &artist.name, &artist.username, threshold))
      .collect()
  }

  fn is_on_air(&self, artist: &ArtistIdentity, current: &[ShowEntry]) -> bool {
    let threshold = self.config.matching.threshold;
    current
      .iter()
      .any(|show| matches(&show.name, &artist.name, &artist.username, threshold))
  }

  /// Alert the followers of the artists behind one upcoming show.
  ///
  /// Never fails: a push error for one subscriber is logged and the rest
  /// still go out.
  async fn notify_show(
    &self,
    show: &ShowEntry,
    current: &[ShowEntry],
    subscribers: &[SubscriberRecord],
    now: DateTime<Utc>,
  ) -> Vec<Dispatch> {
    let matched = self.match_show_to_artists(&show.name).await;
    if matched.is_empty() {
      debug!(show = %show.name, "no artists matched");
      return Vec::new();
    }
    debug!(show = %show.name, artists = ?matched, "show matched artists");

    let to_notify: Vec<ArtistIdentity> = matched
      .into_iter()
      .filter(|artist| !self.is_on_air(artist, current))
      .filter(|artist| {
        self
          .ledger
          .as_ref()
          .is_none_or(|ledger| !ledger.contains(&show.id, &artist.username, now))
      })
      .collect();

    if to_notify.is_empty() {
      info!(
        show = %show.name,
        "all matched artists are already playing or alerted, skipping notifications"
      );
      return Vec::new();
    }

    let mut dispatches = Vec::new();
    for recipient in resolve_recipients(subscribers, &to_notify) {
      if !recipient.subscriber.has_devices() {
        continue;
      }

      let message = PushMessage::show_alert(
        recipient.subscriber.device_tokens.clone(),
        show,
        recipient.artist,
        now,
      );

      match self.collaborators.push().send(message).await {
        Ok(tickets) => dispatches.push(Dispatch {
          show_id:         show.id.clone(),
          artist_username: recipient.artist.username.clone(),
          subscriber_id:   recipient.subscriber.subscriber_id,
          tickets,
        }),
        Err(e) => error!(
          error = %e,
          show = %show.name,
          subscriber = %recipient.subscriber.subscriber_id,
          "error sending show alert"
        ),
      }
    }

    // Only artists with at least one delivered alert are recorded, so a
    // failed send is retried by a later run inside the tolerance window.
    if let Some(ledger) = &self.ledger {
      for artist in &to_notify {
        if dispatches.iter().any(|d| d.artist_username == artist.username) {
          ledger.record(&show.id, &artist.username, now);
        }
      }
    }

    dispatches
  }
}
