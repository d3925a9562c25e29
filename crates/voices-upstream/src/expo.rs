//! Expo push notification delivery.
//!
//! Messages are validated per token, batched into chunks of at most
//! [`CHUNK_LIMIT`], and posted to the Expo push API one chunk at a time. A
//! chunk that fails is logged and its tokens reported as rejected; the
//! remaining chunks are still sent.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use voices_core::{
  push::{DeliveryTicket, PushData, PushMessage},
  source::PushGateway,
};

use crate::{Error, Result, http};

pub const DEFAULT_BASE_URL: &str = "https://exp.host";

/// Most messages Expo accepts in a single request.
pub const CHUNK_LIMIT: usize = 100;

const SEND_PATH: &str = "/--/api/v2/push/send";

/// Whether `token` has the shape of an Expo push token.
///
/// Accepts `ExponentPushToken[..]`, `ExpoPushToken[..]`, and bare
/// UUID-shaped tokens.
pub fn is_expo_push_token(token: &str) -> bool {
  let bracketed = token
    .strip_prefix("ExponentPushToken[")
    .or_else(|| token.strip_prefix("ExpoPushToken["));
  if let Some(rest) = bracketed {
    return rest.len() > 1 && rest.ends_with(']');
  }

  let groups: Vec<&str> = token.split('-').collect();
  groups.len() == 5
    && groups
      .iter()
      .zip([8, 4, 4, 4, 12])
      .all(|(g, n)| g.len() == n && g.chars().all(|c| c.is_ascii_alphanumeric()))
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ExpoGateway {
  client:       Client,
  url:          String,
  access_token: Option<String>,
}

impl ExpoGateway {
  pub fn new(base_url: &str) -> Result<Self> {
    Ok(Self {
      client:       http::client()?,
      url:          http::join(base_url, SEND_PATH),
      access_token: None,
    })
  }

  /// Authenticate requests with an Expo access token.
  pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
    self.access_token = Some(token.into());
    self
  }

  async fn send_chunk(
    &self,
    message: &PushMessage,
    tokens: &[&str],
  ) -> Result<Vec<DeliveryTicket>> {
    let body: Vec<ExpoMessage<'_>> = tokens
      .iter()
      .map(|&to| ExpoMessage {
        to,
        sound: "default",
        title: &message.title,
        body: &message.body,
        data: &message.data,
        priority: "high",
      })
      .collect();

    let mut req = self.client.post(&self.url).json(&body);
    if let Some(token) = &self.access_token {
      req = req.bearer_auth(token);
    }

    let resp: SendResponse = http::check(req.send().await?)?.json().await?;
    tickets_for_chunk(tokens, resp)
  }
}

impl PushGateway for ExpoGateway {
  type Error = Error;

  async fn send(&self, message: PushMessage) -> Result<Vec<DeliveryTicket>> {
    let mut tickets = Vec::with_capacity(message.tokens.len());
    let mut valid = Vec::with_capacity(message.tokens.len());

    for token in &message.tokens {
      if is_expo_push_token(token) {
        valid.push(token.as_str());
      } else {
        warn!(token = %token, "not a valid Expo push token");
        tickets.push(DeliveryTicket::rejected(token.as_str(), "invalid push token"));
      }
    }

    for chunk in valid.chunks(CHUNK_LIMIT) {
      match self.send_chunk(&message, chunk).await {
        Ok(batch) => tickets.extend(batch),
        Err(e) => {
          error!(error = %e, size = chunk.len(), "error sending push notifications");
          let reason = e.to_string();
          tickets.extend(
            chunk
              .iter()
              .map(|&token| DeliveryTicket::rejected(token, reason.as_str())),
          );
        }
      }
    }

    debug!(
      tokens = message.tokens.len(),
      accepted = tickets.iter().filter(|t| t.is_accepted()).count(),
      "push send complete"
    );
    Ok(tickets)
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ExpoMessage<'a> {
  to:       &'a str,
  sound:    &'static str,
  title:    &'a str,
  body:     &'a str,
  data:     &'a PushData,
  priority: &'static str,
}

#[derive(Deserialize)]
struct SendResponse {
  #[serde(default)]
  data:   Vec<ExpoTicket>,
  #[serde(default)]
  errors: Vec<ExpoError>,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ExpoTicket {
  Ok {
    #[serde(default)]
    id: Option<String>,
  },
  Error {
    #[serde(default)]
    message: String,
  },
}

#[derive(Deserialize)]
struct ExpoError {
  #[serde(default)]
  code:    Option<String>,
  message: String,
}

/// Pair each token in a chunk with the ticket Expo returned for it.
///
/// Expo answers with tickets in request order. A request-level `errors`
/// list means nothing in the chunk was accepted.
fn tickets_for_chunk(tokens: &[&str], resp: SendResponse) -> Result<Vec<DeliveryTicket>> {
  if let Some(first) = resp.errors.first() {
    let code = first.code.as_deref().unwrap_or("UNKNOWN");
    return Err(Error::Payload(format!("{code}: {}", first.message)));
  }

  let mut tickets = resp.data.into_iter();
  Ok(
    tokens
      .iter()
      .map(|&token| match tickets.next() {
        Some(ExpoTicket::Ok { id }) => DeliveryTicket::accepted(token, id),
        Some(ExpoTicket::Error { message }) => DeliveryTicket::rejected(token, message),
        None => DeliveryTicket::rejected(token, "no ticket returned"),
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
  use serde_json::{Value, json};

  use super::*;
  use crate::testing::serve;

  fn token(i: usize) -> String { format!("ExponentPushToken[tok{i}]") }

  fn message(tokens: Vec<String>) -> PushMessage {
    PushMessage {
      tokens,
      title: "Upcoming Show Alert".into(),
      body: "Nova will be live in 5 minutes!".into(),
      data: PushData::ShowAlert {
        show_id:         "42".into(),
        artist_username: "djnova".into(),
      },
    }
  }

  #[derive(Clone, Default)]
  struct Recorded {
    chunks:  Arc<Mutex<Vec<Vec<Value>>>>,
    fail_on: Option<usize>,
  }

  async fn push_send(
    State(rec): State<Recorded>,
    Json(body): Json<Vec<Value>>,
  ) -> Result<Json<Value>, StatusCode> {
    let index = {
      let mut chunks = rec.chunks.lock().unwrap();
      chunks.push(body.clone());
      chunks.len() - 1
    };
    if rec.fail_on == Some(index) {
      return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let data: Vec<Value> = body
      .iter()
      .enumerate()
      .map(|(i, _)| json!({"status": "ok", "id": format!("receipt-{index}-{i}")}))
      .collect();
    Ok(Json(json!({ "data": data })))
  }

  async fn gateway(rec: Recorded) -> ExpoGateway {
    let base = serve(move |_| {
      Router::new()
        .route("/--/api/v2/push/send", post(push_send))
        .with_state(rec)
    })
    .await;
    ExpoGateway::new(&base).unwrap()
  }

  #[test]
  fn token_shapes() {
    assert!(is_expo_push_token("ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]"));
    assert!(is_expo_push_token("ExpoPushToken[abc]"));
    assert!(is_expo_push_token("a1b2c3d4-e5f6-a7b8-c9d0-e1f2a3b4c5d6"));

    assert!(!is_expo_push_token(""));
    assert!(!is_expo_push_token("ExponentPushToken[]"));
    assert!(!is_expo_push_token("ExponentPushToken[abc"));
    assert!(!is_expo_push_token("fcm:abcdef"));
    assert!(!is_expo_push_token("a1b2c3d4-e5f6-a7b8-c9d0-e1f2a3b4c5d"));
  }

  #[tokio::test]
  async fn sends_expected_wire_message() {
    let rec = Recorded::default();
    let gw = gateway(rec.clone()).await;

    let tickets = gw.send(message(vec![token(1)])).await.unwrap();
    assert_eq!(tickets, vec![DeliveryTicket::accepted(
      token(1),
      Some("receipt-0-0".into())
    )]);

    let chunks = rec.chunks.lock().unwrap();
    assert_eq!(
      chunks[0][0],
      json!({
        "to": token(1),
        "sound": "default",
        "title": "Upcoming Show Alert",
        "body": "Nova will be live in 5 minutes!",
        "data": {"type": "show_alert", "showId": "42", "artistUsername": "djnova"},
        "priority": "high"
      })
    );
  }

  #[tokio::test]
  async fn splits_into_chunks_of_one_hundred() {
    let rec = Recorded::default();
    let gw = gateway(rec.clone()).await;

    let tokens: Vec<String> = (0..250).map(token).collect();
    let tickets = gw.send(message(tokens)).await.unwrap();

    assert_eq!(tickets.len(), 250);
    assert!(tickets.iter().all(DeliveryTicket::is_accepted));
    let sizes: Vec<usize> = rec.chunks.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
  }

  #[tokio::test]
  async fn failed_chunk_does_not_stop_later_chunks() {
    let rec = Recorded { fail_on: Some(0), ..Default::default() };
    let gw = gateway(rec.clone()).await;

    let tokens: Vec<String> = (0..150).map(token).collect();
    let tickets = gw.send(message(tokens)).await.unwrap();

    assert_eq!(tickets.len(), 150);
    assert_eq!(tickets.iter().filter(|t| !t.is_accepted()).count(), 100);
    assert!(tickets[100..].iter().all(DeliveryTicket::is_accepted));
    assert_eq!(rec.chunks.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn invalid_tokens_are_never_sent() {
    let rec = Recorded::default();
    let gw = gateway(rec.clone()).await;

    let tickets = gw
      .send(message(vec!["garbage".into(), token(7)]))
      .await
      .unwrap();

    assert_eq!(tickets[0], DeliveryTicket::rejected("garbage", "invalid push token"));
    assert!(tickets[1].is_accepted());

    let chunks = rec.chunks.lock().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len(), 1);
  }

  #[tokio::test]
  async fn all_invalid_makes_no_request() {
    let rec = Recorded::default();
    let gw = gateway(rec.clone()).await;

    let tickets = gw.send(message(vec!["nope".into()])).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert!(rec.chunks.lock().unwrap().is_empty());
  }

  #[test]
  fn per_token_errors_become_rejections() {
    let resp: SendResponse = serde_json::from_value(json!({
      "data": [
        {"status": "ok", "id": "r1"},
        {"status": "error", "message": "not registered", "details": {"error": "DeviceNotRegistered"}}
      ]
    }))
    .unwrap();

    let tickets = tickets_for_chunk(&["a", "b", "c"], resp).unwrap();
    assert_eq!(tickets, vec![
      DeliveryTicket::accepted("a", Some("r1".into())),
      DeliveryTicket::rejected("b", "not registered"),
      DeliveryTicket::rejected("c", "no ticket returned"),
    ]);
  }

  #[test]
  fn request_level_errors_fail_the_chunk() {
    let resp: SendResponse = serde_json::from_value(json!({
      "errors": [{"code": "PUSH_TOO_MANY_EXPERIENCE_IDS", "message": "mixed projects"}]
    }))
    .unwrap();
    assert!(tickets_for_chunk(&["a"], resp).is_err());
  }
}
