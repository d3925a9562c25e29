//! Traits for the external collaborators a notifier run talks to.
//!
//! Concrete implementations live in `voices-upstream` (schedule, roster,
//! push) and `voices-store-sqlite` (subscribers). The notifier depends on
//! these abstractions only.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
  artist::ArtistIdentity,
  push::{DeliveryTicket, PushMessage},
  schedule::ShowEntry,
  subscriber::SubscriberRecord,
};

/// The station's weekly programme schedule.
pub trait ScheduleSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every show in the current week, with wall-clock times interpreted in
  /// `tz`.
  fn fetch_week(
    &self,
    tz: Tz,
  ) -> impl Future<Output = Result<Vec<ShowEntry>, Self::Error>> + Send + '_;
}

/// The roster of artists and resident hosts.
pub trait ArtistDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The full current roster. Called once per upcoming show; no caching is
  /// expected.
  fn list_artists(
    &self,
  ) -> impl Future<Output = Result<Vec<ArtistIdentity>, Self::Error>> + Send + '_;
}

/// Read-only view of subscribers, as used by a notifier run.
pub trait SubscriberDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every subscriber with notifications enabled.
  fn notifiable_subscribers(
    &self,
  ) -> impl Future<Output = Result<Vec<SubscriberRecord>, Self::Error>> + Send + '_;
}

/// Read-write subscriber storage.
///
/// Mutations return `Ok(None)` when the subscriber does not exist.
pub trait SubscriberStore: SubscriberDirectory {
  /// Create a subscriber with notifications enabled and nothing followed.
  fn add_subscriber(
    &self,
  ) -> impl Future<Output = Result<SubscriberRecord, Self::Error>> + Send + '_;

  fn get_subscriber(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SubscriberRecord>, Self::Error>> + Send + '_;

  /// Register a device token. Registering the same token twice is a no-op.
  fn add_device_token(
    &self,
    id: Uuid,
    token: String,
  ) -> impl Future<Output = Result<Option<SubscriberRecord>, Self::Error>> + Send + '_;

  /// Follow an artist by username. Following twice is a no-op.
  fn subscribe(
    &self,
    id: Uuid,
    artist_username: String,
  ) -> impl Future<Output = Result<Option<SubscriberRecord>, Self::Error>> + Send + '_;

  /// Stop following an artist. Unfollowing an unknown artist is a no-op.
  fn unsubscribe(
    &self,
    id: Uuid,
    artist_username: String,
  ) -> impl Future<Output = Result<Option<SubscriberRecord>, Self::Error>> + Send + '_;

  fn set_notifications(
    &self,
    id: Uuid,
    enabled: bool,
  ) -> impl Future<Output = Result<Option<SubscriberRecord>, Self::Error>> + Send + '_;
}

/// The push-delivery provider.
///
/// Implementations validate tokens, batch to respect provider limits, and
/// report a ticket per token. A bad token or a failed batch is reported in
/// the tickets, not as an `Err`.
pub trait PushGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    message: PushMessage,
  ) -> impl Future<Output = Result<Vec<DeliveryTicket>, Self::Error>> + Send + '_;
}

/// The bundle of collaborators a [`Notifier`](crate::notifier::Notifier)
/// is wired to.
pub trait Collaborators: Send + Sync + 'static {
  type Schedule: ScheduleSource;
  type Directory: ArtistDirectory;
  type Subscribers: SubscriberDirectory;
  type Push: PushGateway;

  fn schedule(&self) -> &Self::Schedule;
  fn directory(&self) -> &Self::Directory;
  fn subscribers(&self) -> &Self::Subscribers;
  fn push(&self) -> &Self::Push;
}
