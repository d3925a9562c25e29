//! [`SqliteStore`]: the SQLite implementation of [`SubscriberStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use voices_core::{
  source::{SubscriberDirectory, SubscriberStore},
  subscriber::SubscriberRecord,
};

use crate::{
  Result,
  encode::{RawSubscriber, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Voices subscriber store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply `change` to an existing subscriber inside a transaction and
  /// return the updated record, or `None` if the subscriber does not exist.
  async fn mutate<F>(&self, id: Uuid, change: F) -> Result<Option<SubscriberRecord>>
  where
    F: FnOnce(&Connection, &str) -> rusqlite::Result<()> + Send + 'static,
  {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !subscriber_exists(&tx, &id_str)? {
          return Ok(None);
        }
        change(&*tx, &id_str)?;
        let raw = load_subscriber(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSubscriber::into_record).transpose()
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn subscriber_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM subscribers WHERE subscriber_id = ?1",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn column_strings(conn: &Connection, sql: &str, id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(sql)?;
  stmt
    .query_map(rusqlite::params![id], |row| row.get(0))?
    .collect()
}

fn load_subscriber(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawSubscriber>> {
  let enabled: Option<bool> = conn
    .query_row(
      "SELECT notifications_enabled FROM subscribers WHERE subscriber_id = ?1",
      rusqlite::params![id],
      |row| row.get(0),
    )
    .optional()?;

  let Some(notifications_enabled) = enabled else {
    return Ok(None);
  };

  let device_tokens = column_strings(
    conn,
    "SELECT token FROM device_tokens WHERE subscriber_id = ?1 ORDER BY rowid",
    id,
  )?;
  let subscribed_artists = column_strings(
    conn,
    "SELECT artist_username FROM subscriptions WHERE subscriber_id = ?1",
    id,
  )?;

  Ok(Some(RawSubscriber {
    subscriber_id: id.to_owned(),
    notifications_enabled,
    device_tokens,
    subscribed_artists,
  }))
}

// ─── SubscriberDirectory impl ────────────────────────────────────────────────

impl SubscriberDirectory for SqliteStore {
  type Error = crate::Error;

  async fn notifiable_subscribers(&self) -> Result<Vec<SubscriberRecord>> {
    let raws: Vec<RawSubscriber> = self
      .conn
      .call(|conn| {
        let ids: Vec<String> = {
          let mut stmt = conn.prepare(
            "SELECT subscriber_id FROM subscribers
             WHERE notifications_enabled = 1
             ORDER BY created_at, subscriber_id",
          )?;
          stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?
        };

        let mut raws = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(raw) = load_subscriber(conn, &id)? {
            raws.push(raw);
          }
        }
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawSubscriber::into_record).collect()
  }
}

// ─── SubscriberStore impl ────────────────────────────────────────────────────

impl SubscriberStore for SqliteStore {
  async fn add_subscriber(&self) -> Result<SubscriberRecord> {
    let record = SubscriberRecord {
      subscriber_id:         Uuid::new_v4(),
      device_tokens:         Vec::new(),
      subscribed_artists:    Default::default(),
      notifications_enabled: true,
    };

    let id_str = encode_uuid(record.subscriber_id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscribers (subscriber_id, created_at, notifications_enabled)
           VALUES (?1, ?2, 1)",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_subscriber(&self, id: Uuid) -> Result<Option<SubscriberRecord>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(load_subscriber(conn, &id_str)?))
      .await?;

    raw.map(RawSubscriber::into_record).transpose()
  }

  async fn add_device_token(
    &self,
    id: Uuid,
    token: String,
  ) -> Result<Option<SubscriberRecord>> {
    let at_str = encode_dt(Utc::now());
    self
      .mutate(id, move |conn, id_str| {
        conn.execute(
          "INSERT OR IGNORE INTO device_tokens (subscriber_id, token, registered_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, token, at_str],
        )?;
        Ok(())
      })
      .await
  }

  async fn subscribe(
    &self,
    id: Uuid,
    artist_username: String,
  ) -> Result<Option<SubscriberRecord>> {
    let at_str = encode_dt(Utc::now());
    self
      .mutate(id, move |conn, id_str| {
        conn.execute(
          "INSERT OR IGNORE INTO subscriptions (subscriber_id, artist_username, subscribed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, artist_username, at_str],
        )?;
        Ok(())
      })
      .await
  }

  async fn unsubscribe(
    &self,
    id: Uuid,
    artist_username: String,
  ) -> Result<Option<SubscriberRecord>> {
    self
      .mutate(id, move |conn, id_str| {
        conn.execute(
          "DELETE FROM subscriptions WHERE subscriber_id = ?1 AND artist_username = ?2",
          rusqlite::params![id_str, artist_username],
        )?;
        Ok(())
      })
      .await
  }

  async fn set_notifications(
    &self,
    id: Uuid,
    enabled: bool,
  ) -> Result<Option<SubscriberRecord>> {
    self
      .mutate(id, move |conn, id_str| {
        conn.execute(
          "UPDATE subscribers SET notifications_enabled = ?2 WHERE subscriber_id = ?1",
          rusqlite::params![id_str, enabled],
        )?;
        Ok(())
      })
      .await
  }
}
