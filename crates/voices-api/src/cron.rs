//! `GET|POST /cron`: run the upcoming-show check now.
//!
//! Intended for an external scheduler (a hosting platform's cron, or a
//! manual trigger). Shares the single-flight guard with the in-process
//! scheduler.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info, warn};
use voices_core::{Error, source::Collaborators};

use crate::AppState;

pub async fn check<C: Collaborators>(State(state): State<AppState<C>>) -> Response {
  match state.notifier.check_upcoming_shows().await {
    Ok(report) => {
      info!(sent = report.messages_sent(), "triggered check complete");
      (
        StatusCode::OK,
        Json(json!({
          "success": true,
          "message": "Shows checked successfully",
          "sent": report.messages_sent(),
        })),
      )
        .into_response()
    }
    Err(Error::AlreadyRunning) => {
      warn!("check requested while another is running");
      (
        StatusCode::CONFLICT,
        Json(json!({ "success": false, "error": "A check is already running" })),
      )
        .into_response()
    }
    Err(e) => {
      error!(error = %e, "error running scheduled task");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Failed to check shows" })),
      )
        .into_response()
    }
  }
}
