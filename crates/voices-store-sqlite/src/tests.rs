//! Integration tests for `SqliteStore` against an in-memory database.

use uuid::Uuid;
use voices_core::source::{SubscriberDirectory, SubscriberStore};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Subscribers ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subscriber() {
  let s = store().await;

  let created = s.add_subscriber().await.unwrap();
  assert!(created.notifications_enabled);
  assert!(created.device_tokens.is_empty());
  assert!(created.subscribed_artists.is_empty());

  let fetched = s.get_subscriber(created.subscriber_id).await.unwrap();
  assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn get_subscriber_missing_returns_none() {
  let s = store().await;
  let result = s.get_subscriber(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn mutations_on_missing_subscriber_return_none() {
  let s = store().await;
  let id = Uuid::new_v4();

  assert!(s.add_device_token(id, "tok".into()).await.unwrap().is_none());
  assert!(s.subscribe(id, "djnova".into()).await.unwrap().is_none());
  assert!(s.unsubscribe(id, "djnova".into()).await.unwrap().is_none());
  assert!(s.set_notifications(id, false).await.unwrap().is_none());
}

// ─── Device tokens ───────────────────────────────────────────────────────────

#[tokio::test]
async fn device_tokens_keep_registration_order() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();

  s.add_device_token(sub.subscriber_id, "ExponentPushToken[b]".into())
    .await
    .unwrap();
  let updated = s
    .add_device_token(sub.subscriber_id, "ExponentPushToken[a]".into())
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.device_tokens, vec![
    "ExponentPushToken[b]".to_string(),
    "ExponentPushToken[a]".to_string(),
  ]);
}

#[tokio::test]
async fn duplicate_device_token_is_ignored() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();

  for _ in 0..3 {
    s.add_device_token(sub.subscriber_id, "ExponentPushToken[x]".into())
      .await
      .unwrap();
  }

  let fetched = s.get_subscriber(sub.subscriber_id).await.unwrap().unwrap();
  assert_eq!(fetched.device_tokens.len(), 1);
}

#[tokio::test]
async fn same_token_on_two_subscribers_is_allowed() {
  let s = store().await;
  let a = s.add_subscriber().await.unwrap();
  let b = s.add_subscriber().await.unwrap();

  s.add_device_token(a.subscriber_id, "shared".into()).await.unwrap();
  let b = s
    .add_device_token(b.subscriber_id, "shared".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(b.device_tokens, vec!["shared".to_string()]);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_and_unsubscribe() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();
  let id = sub.subscriber_id;

  s.subscribe(id, "djnova".into()).await.unwrap();
  let updated = s.subscribe(id, "marcus99".into()).await.unwrap().unwrap();
  assert!(updated.follows("djnova"));
  assert!(updated.follows("marcus99"));

  let updated = s.unsubscribe(id, "djnova".into()).await.unwrap().unwrap();
  assert!(!updated.follows("djnova"));
  assert!(updated.follows("marcus99"));
}

#[tokio::test]
async fn subscribe_twice_is_idempotent() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();

  s.subscribe(sub.subscriber_id, "djnova".into()).await.unwrap();
  let updated = s
    .subscribe(sub.subscriber_id, "djnova".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.subscribed_artists.len(), 1);
}

#[tokio::test]
async fn unsubscribe_unknown_artist_is_noop() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();
  s.subscribe(sub.subscriber_id, "djnova".into()).await.unwrap();

  let updated = s
    .unsubscribe(sub.subscriber_id, "nobody".into())
    .await
    .unwrap()
    .unwrap();
  assert!(updated.follows("djnova"));
}

// ─── Notification preference ─────────────────────────────────────────────────

#[tokio::test]
async fn notifiable_subscribers_excludes_disabled() {
  let s = store().await;
  let on = s.add_subscriber().await.unwrap();
  let off = s.add_subscriber().await.unwrap();

  s.subscribe(on.subscriber_id, "djnova".into()).await.unwrap();
  s.add_device_token(on.subscriber_id, "tok-on".into()).await.unwrap();
  let off = s
    .set_notifications(off.subscriber_id, false)
    .await
    .unwrap()
    .unwrap();
  assert!(!off.notifications_enabled);

  let notifiable = s.notifiable_subscribers().await.unwrap();
  assert_eq!(notifiable.len(), 1);
  assert_eq!(notifiable[0].subscriber_id, on.subscriber_id);
  assert!(notifiable[0].follows("djnova"));
  assert_eq!(notifiable[0].device_tokens, vec!["tok-on".to_string()]);
}

#[tokio::test]
async fn reenabling_notifications_restores_subscriber() {
  let s = store().await;
  let sub = s.add_subscriber().await.unwrap();

  s.set_notifications(sub.subscriber_id, false).await.unwrap();
  assert!(s.notifiable_subscribers().await.unwrap().is_empty());

  s.set_notifications(sub.subscriber_id, true).await.unwrap();
  assert_eq!(s.notifiable_subscribers().await.unwrap().len(), 1);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_store_keeps_data() {
  let path = std::env::temp_dir()
    .join(format!("voices-store-{}.db", Uuid::new_v4()));

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let sub = s.add_subscriber().await.unwrap();
    s.subscribe(sub.subscriber_id, "djnova".into()).await.unwrap();
    sub.subscriber_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let fetched = s.get_subscriber(id).await.unwrap().unwrap();
  assert!(fetched.follows("djnova"));

  drop(s);
  let _ = std::fs::remove_file(&path);
}
