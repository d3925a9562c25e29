//! The Airtime `week-info` endpoint.
//!
//! The payload is an object keyed by day (`monday`, `nextmonday`, ...), each
//! holding a list of show entries. Other keys carry scalars such as the API
//! version and are ignored. Entry timestamps come back as wall-clock strings
//! in the timezone named in the request.

use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use voices_core::{schedule::ShowEntry, source::ScheduleSource};

use crate::{Error, Result, http};

pub const DEFAULT_BASE_URL: &str = "https://voicesradio.airtime.pro";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Client for an Airtime station's public schedule API.
#[derive(Clone)]
pub struct AirtimeSchedule {
  client:   Client,
  base_url: String,
}

impl AirtimeSchedule {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    Ok(Self { client: http::client()?, base_url: base_url.into() })
  }
}

impl ScheduleSource for AirtimeSchedule {
  type Error = Error;

  async fn fetch_week(&self, tz: Tz) -> Result<Vec<ShowEntry>> {
    let url = http::join(&self.base_url, "/api/week-info");
    let resp = self
      .client
      .get(&url)
      .query(&[("timezone", tz.name())])
      .send()
      .await?;
    let body: Value = http::check(resp)?.json().await?;

    let shows = parse_week_info(&body, tz)?;
    debug!(count = shows.len(), "fetched weekly schedule");
    Ok(shows)
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawShow {
  id:     RawId,
  name:   String,
  starts: String,
  ends:   String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Number(i64),
  Text(String),
}

impl From<RawId> for String {
  fn from(id: RawId) -> Self {
    match id {
      RawId::Number(n) => n.to_string(),
      RawId::Text(s) => s,
    }
  }
}

/// Flatten a `week-info` payload into show entries.
///
/// Malformed entries are skipped with a warning; only a body that is not a
/// JSON object at all is an error.
pub fn parse_week_info(body: &Value, tz: Tz) -> Result<Vec<ShowEntry>> {
  let Value::Object(days) = body else {
    return Err(Error::Payload("week-info body is not an object".into()));
  };

  let mut shows = Vec::new();
  for (day, value) in days {
    let entries = match value {
      Value::Array(items) => items.as_slice(),
      Value::Object(_) => std::slice::from_ref(value),
      _ => continue,
    };

    for entry in entries.iter().filter(|e| e.is_object()) {
      match parse_entry(entry, tz) {
        Ok(show) => shows.push(show),
        Err(e) => warn!(day = %day, error = %e, "skipping malformed schedule entry"),
      }
    }
  }
  Ok(shows)
}

fn parse_entry(entry: &Value, tz: Tz) -> Result<ShowEntry> {
  let raw = RawShow::deserialize(entry)?;
  let starts_at = parse_show_time(&raw.starts, tz)
    .ok_or_else(|| Error::Payload(format!("unreadable start time {:?}", raw.starts)))?;
  let ends_at = parse_show_time(&raw.ends, tz)
    .ok_or_else(|| Error::Payload(format!("unreadable end time {:?}", raw.ends)))?;

  Ok(ShowEntry { id: raw.id.into(), name: raw.name, starts_at, ends_at })
}

/// Parse an RFC 3339 timestamp, or a naive one taken as wall-clock time in
/// `tz`. Ambiguous local times resolve to the earlier instant; times that
/// fall in a DST gap do not parse.
pub fn parse_show_time(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  NAIVE_FORMATS.iter().find_map(|fmt| {
    let naive = NaiveDateTime::parse_from_str(s, fmt).ok()?;
    tz.from_local_datetime(&naive)
      .earliest()
      .map(|dt| dt.with_timezone(&Utc))
  })
}
