//! Programme schedule entries and the current/upcoming partition.
//!
//! A run looks at the whole week's schedule and keeps two slices of it: the
//! shows on air at the evaluation instant, and the shows starting at the next
//! top of the hour in the station's timezone.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result, source::ScheduleSource};

/// One scheduled programme instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowEntry {
  /// Opaque identifier assigned by the schedule service.
  pub id:        String,
  /// Free-text title, not normalised.
  pub name:      String,
  pub starts_at: DateTime<Utc>,
  pub ends_at:   DateTime<Utc>,
}

impl ShowEntry {
  /// Whether the show's half-open `[starts_at, ends_at)` interval contains
  /// `now`.
  pub fn is_on_air(&self, now: DateTime<Utc>) -> bool {
    self.starts_at <= now && now < self.ends_at
  }
}

/// The two slices of the schedule a notifier run cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowPartition {
  /// Shows on air at the evaluation instant.
  pub current:  Vec<ShowEntry>,
  /// Shows starting at the next top of the hour.
  pub upcoming: Vec<ShowEntry>,
}

impl ShowPartition {
  pub fn is_empty(&self) -> bool {
    self.current.is_empty() && self.upcoming.is_empty()
  }
}

/// Parse an IANA timezone name such as `"Europe/London"`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
  name
    .parse::<Tz>()
    .map_err(|_| Error::UnknownTimezone(name.to_owned()))
}

/// The next top of the hour on the wall clock in `tz`, after `now`.
///
/// The hour is truncated under the UTC offset in force at `now` and the
/// boundary lies one absolute hour later. Consecutive hourly runs therefore
/// see distinct boundaries even across a DST transition: a spring-forward
/// boundary lands on the first wall-clock hour after the gap, and the
/// repeated hour of a fall-back night is checked once under each offset.
pub fn next_hour_boundary(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
  let local = now.with_timezone(&tz);
  let hour_start = local.duration_trunc(TimeDelta::hours(1)).unwrap_or(local);
  (hour_start + TimeDelta::hours(1)).with_timezone(&Utc)
}

/// Split `shows` into the current and upcoming slices at `now`.
///
/// A show is upcoming when its start lies within `tolerance` of the next
/// hour boundary. A zero tolerance means exact-instant equality, so two
/// runs inside the same hour cannot both see the same show as upcoming
/// once its start has passed. A show may land in both slices.
pub fn partition(
  shows: Vec<ShowEntry>,
  now: DateTime<Utc>,
  tz: Tz,
  tolerance: TimeDelta,
) -> ShowPartition {
  let next_hour = next_hour_boundary(now, tz);
  let mut split = ShowPartition::default();

  for show in shows {
    if show.is_on_air(now) {
      split.current.push(show.clone());
    }
    if (show.starts_at - next_hour).abs() <= tolerance {
      split.upcoming.push(show);
    }
  }

  split
}

/// Fetch the week's schedule from `source` and partition it at `now`.
///
/// Any fetch or parse failure is logged and yields an empty partition, so
/// the caller skips the cycle instead of failing it.
pub async fn fetch_schedule<S>(
  source: &S,
  tz: Tz,
  now: DateTime<Utc>,
  tolerance: TimeDelta,
) -> ShowPartition
where
  S: ScheduleSource,
{
  match source.fetch_week(tz).await {
    Ok(shows) => partition(shows, now, tz, tolerance),
    Err(e) => {
      warn!(error = %e, "error fetching show data");
      ShowPartition::default()
    }
  }
}
