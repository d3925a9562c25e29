//! Handlers for `/subscribers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/subscribers` | 201 with the new record |
//! | `GET`  | `/subscribers/{id}` | 404 if not found |
//! | `POST` | `/subscribers/{id}/subscribe/{username}` | 400 if already followed |
//! | `POST` | `/subscribers/{id}/unsubscribe/{username}` | |
//! | `POST` | `/subscribers/{id}/device-token` | Body: `{"token":"ExponentPushToken[…]"}` |
//! | `PUT`  | `/subscribers/{id}/notifications` | Body: `{"enabled":false}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use voices_core::{
  source::{Collaborators, SubscriberStore},
  subscriber::SubscriberRecord,
};

use crate::{AppState, error::ApiError};

fn not_found(id: Uuid) -> ApiError {
  ApiError::NotFound(format!("subscriber {id} not found"))
}

// ─── Create / get ────────────────────────────────────────────────────────────

/// `POST /subscribers`
pub async fn create<C>(
  State(state): State<AppState<C>>,
) -> Result<impl IntoResponse, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let record = state
    .store()
    .add_subscriber()
    .await
    .map_err(ApiError::store)?;
  info!(subscriber = %record.subscriber_id, "subscriber created");
  Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /subscribers/{id}`
pub async fn get_one<C>(
  State(state): State<AppState<C>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubscriberRecord>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let record = state
    .store()
    .get_subscriber(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(record))
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

/// `POST /subscribers/{id}/subscribe/{username}`
pub async fn subscribe<C>(
  State(state): State<AppState<C>>,
  Path((id, username)): Path<(Uuid, String)>,
) -> Result<Json<SubscriberRecord>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let store = state.store();
  let current = store
    .get_subscriber(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  if current.follows(&username) {
    return Err(ApiError::BadRequest("Already subscribed to this artist".into()));
  }

  let record = store
    .subscribe(id, username)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(record))
}

/// `POST /subscribers/{id}/unsubscribe/{username}`
pub async fn unsubscribe<C>(
  State(state): State<AppState<C>>,
  Path((id, username)): Path<(Uuid, String)>,
) -> Result<Json<SubscriberRecord>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let record = state
    .store()
    .unsubscribe(id, username)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(record))
}

// ─── Devices and preferences ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeviceTokenBody {
  #[serde(default)]
  pub token: String,
}

/// `POST /subscribers/{id}/device-token`
pub async fn add_device_token<C>(
  State(state): State<AppState<C>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DeviceTokenBody>,
) -> Result<Json<SubscriberRecord>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let token = body.token.trim();
  if token.is_empty() {
    return Err(ApiError::BadRequest("Token is required".into()));
  }

  let record = state
    .store()
    .add_device_token(id, token.to_owned())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct NotificationsBody {
  pub enabled: bool,
}

/// `PUT /subscribers/{id}/notifications`
pub async fn set_notifications<C>(
  State(state): State<AppState<C>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NotificationsBody>,
) -> Result<Json<SubscriberRecord>, ApiError>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  let record = state
    .store()
    .set_notifications(id, body.enabled)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(record))
}
