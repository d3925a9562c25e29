//! Human-readable "time until show" strings for alert bodies.

use chrono::{DateTime, Utc};

/// Render the whole minutes between `now` and `target`.
///
/// Under an hour renders as `"<N> minutes"`; otherwise as `"<H> hour"` or
/// `"<H> hours"`, followed by `" and <M> minutes"` when there is a
/// remainder. Minutes are floored, and past targets are not special-cased:
/// a target thirty seconds ago renders as `"-1 minutes"`.
pub fn format_time_until(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let minutes = (target - now).num_milliseconds().div_euclid(60_000);
  if minutes < 60 {
    return format!("{minutes} minutes");
  }

  let hours = minutes / 60;
  let remainder = minutes % 60;
  let plural = if hours > 1 { "s" } else { "" };
  if remainder > 0 {
    format!("{hours} hour{plural} and {remainder} minutes")
  } else {
    format!("{hours} hour{plural}")
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap()
  }

  fn until(delta: TimeDelta) -> String {
    format_time_until(now() + delta, now())
  }

  #[test]
  fn under_an_hour() {
    assert_eq!(until(TimeDelta::minutes(45)), "45 minutes");
    assert_eq!(until(TimeDelta::minutes(5)), "5 minutes");
    assert_eq!(until(TimeDelta::minutes(1)), "1 minutes");
  }

  #[test]
  fn exactly_an_hour() {
    assert_eq!(until(TimeDelta::minutes(60)), "1 hour");
  }

  #[test]
  fn hours_and_minutes() {
    assert_eq!(until(TimeDelta::minutes(90)), "1 hour and 30 minutes");
    assert_eq!(until(TimeDelta::minutes(125)), "2 hours and 5 minutes");
    assert_eq!(until(TimeDelta::hours(3)), "3 hours");
  }

  #[test]
  fn partial_minutes_are_floored() {
    assert_eq!(until(TimeDelta::seconds(5 * 60 + 59)), "5 minutes");
  }

  #[test]
  fn past_targets_render_negative() {
    assert_eq!(until(TimeDelta::zero()), "0 minutes");
    assert_eq!(until(TimeDelta::seconds(-30)), "-1 minutes");
    assert_eq!(until(TimeDelta::minutes(-5)), "-5 minutes");
  }
}
