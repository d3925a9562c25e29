//! Operator endpoints, behind Basic auth.
//!
//! Request and response bodies use camelCase keys.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use voices_core::{
  artist::ArtistIdentity,
  push::{DeliveryTicket, PushData, PushMessage},
  source::{Collaborators, PushGateway as _, SubscriberStore},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

const DEFAULT_TEST_TITLE: &str = "Test Notification";
const DEFAULT_TEST_BODY: &str = "This is a test notification";

// ─── Test notification ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotificationBody {
  pub subscriber_id: Uuid,
  pub title:         Option<String>,
  pub message:       Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestNotificationResponse {
  pub message: &'static str,
  pub results: Vec<DeliveryTicket>,
}

/// `POST /admin/test-notification`
///
/// Sends to every device of the subscriber, whether or not they have
/// notifications enabled.
pub async fn test_notification<C>(
  _auth: Authenticated,
  State(state): State<AppState<C>>,
  Json(body): Json<TestNotificationBody>,
) -> Result<Json<TestNotificationResponse>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let id = body.subscriber_id;
  let subscriber = state
    .store()
    .get_subscriber(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subscriber {id} not found")))?;

  if !subscriber.has_devices() {
    return Err(ApiError::BadRequest("Subscriber has no registered devices".into()));
  }

  let message = PushMessage {
    tokens: subscriber.device_tokens,
    title:  body.title.unwrap_or_else(|| DEFAULT_TEST_TITLE.to_owned()),
    body:   body.message.unwrap_or_else(|| DEFAULT_TEST_BODY.to_owned()),
    data:   PushData::Test { timestamp: Utc::now() },
  };

  let results = state
    .notifier
    .collaborators()
    .push()
    .send(message)
    .await
    .map_err(|e| ApiError::Upstream(Box::new(e)))?;

  info!(subscriber = %id, devices = results.len(), "test notification sent");
  Ok(Json(TestNotificationResponse { message: "Test notification sent", results }))
}

// ─── Test artist match ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestArtistMatchBody {
  #[serde(default)]
  pub show_title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestArtistMatchResponse {
  pub show_title:      String,
  pub matched_artists: Vec<ArtistIdentity>,
  pub match_count:     usize,
}

/// `POST /admin/test-artist-match`
pub async fn test_artist_match<C: Collaborators>(
  _auth: Authenticated,
  State(state): State<AppState<C>>,
  Json(body): Json<TestArtistMatchBody>,
) -> Result<Json<TestArtistMatchResponse>, ApiError> {
  if body.show_title.trim().is_empty() {
    return Err(ApiError::BadRequest("Show title is required".into()));
  }

  let matched_artists = state.notifier.match_show_to_artists(&body.show_title).await;
  Ok(Json(TestArtistMatchResponse {
    show_title: body.show_title,
    match_count: matched_artists.len(),
    matched_artists,
  }))
}
