//! In-process trigger for the upcoming-show check.
//!
//! Fires once an hour at a fixed wall-clock minute in the station's
//! timezone. The default minute, 55, gives listeners a five-minute warning
//! for shows that start on the hour.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Timelike as _, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use voices_core::{Error, notifier::Notifier, source::Collaborators};

pub const DEFAULT_MINUTE: u32 = 55;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy)]
pub struct HourlyScheduler {
  minute: u32,
  tz:     Tz,
}

impl HourlyScheduler {
  /// `minute` is clamped to `0..=59`.
  pub fn new(minute: u32, tz: Tz) -> Self {
    Self { minute: minute.min(59), tz }
  }

  /// The first whole minute strictly after `now` whose wall-clock minute in
  /// the scheduler's timezone is the configured one.
  pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let start = now
      .with_second(0)
      .and_then(|t| t.with_nanosecond(0))
      .unwrap_or(now)
      + TimeDelta::minutes(1);

    (0..MINUTES_PER_DAY)
      .map(|i| start + TimeDelta::minutes(i))
      .find(|t| t.with_timezone(&self.tz).minute() == self.minute)
      .unwrap_or(start + TimeDelta::hours(1))
  }

  /// Run the check at every fire time until the task is aborted.
  pub fn spawn<C: Collaborators>(self, notifier: Arc<Notifier<C>>) -> JoinHandle<()> {
    tokio::spawn(async move {
      loop {
        let now = Utc::now();
        let fire = self.next_fire(now);
        debug!(at = %fire, "next scheduled check");
        tokio::time::sleep((fire - now).to_std().unwrap_or_default()).await;

        match notifier.check_upcoming_shows().await {
          Ok(report) => info!(
            upcoming = report.upcoming_shows,
            sent = report.messages_sent(),
            "scheduled check complete"
          ),
          Err(Error::AlreadyRunning) => {
            warn!("scheduled check skipped: another check is running")
          }
          Err(e) => error!(error = %e, "scheduled check failed"),
        }
      }
    })
  }
}
