//! JSON REST API for Voices.
//!
//! Exposes an axum [`Router`] over a [`Notifier`] whose subscriber
//! collaborator is a full [`SubscriberStore`]. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", voices_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod cron;
pub mod error;
pub mod subscribers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use voices_core::{
  notifier::Notifier,
  source::{Collaborators, SubscriberStore},
};

pub use auth::AuthConfig;
pub use error::ApiError;


// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<C> {
  pub notifier: Arc<Notifier<C>>,
  pub auth:     Arc<AuthConfig>,
}

impl<C> Clone for AppState<C> {
  fn clone(&self) -> Self {
    Self {
      notifier: Arc::clone(&self.notifier),
      auth:     Arc::clone(&self.auth),
    }
  }
}

impl<C: Collaborators> AppState<C> {
  pub fn new(notifier: Arc<Notifier<C>>, auth: AuthConfig) -> Self {
    Self { notifier, auth: Arc::new(auth) }
  }

  /// The subscriber store the notifier reads from.
  pub fn store(&self) -> &C::Subscribers { self.notifier.collaborators().subscribers() }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C>(state: AppState<C>) -> Router<()>
where
  C: Collaborators,
  C::Subscribers: SubscriberStore,
{
  Router::new()
    // Trigger
    .route("/cron", get(cron::check::<C>).post(cron::check::<C>))
    // Subscribers
    .route("/subscribers", post(subscribers::create::<C>))
    .route("/subscribers/{id}", get(subscribers::get_one::<C>))
    .route(
      "/subscribers/{id}/subscribe/{username}",
      post(subscribers::subscribe::<C>),
    )
    .route(
      "/subscribers/{id}/unsubscribe/{username}",
      post(subscribers::unsubscribe::<C>),
    )
    .route(
      "/subscribers/{id}/device-token",
      post(subscribers::add_device_token::<C>),
    )
    .route(
      "/subscribers/{id}/notifications",
      put(subscribers::set_notifications::<C>),
    )
    // Admin
    .route("/admin/test-notification", post(admin::test_notification::<C>))
    .route("/admin/test-artist-match", post(admin::test_artist_match::<C>))
    .with_state(state)
}
