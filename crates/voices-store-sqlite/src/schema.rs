//! SQL schema for the Voices SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subscribers (
    subscriber_id         TEXT PRIMARY KEY,
    created_at            TEXT NOT NULL,
    notifications_enabled INTEGER NOT NULL DEFAULT 1
);

-- Push addresses; rowid order is registration order.
CREATE TABLE IF NOT EXISTS device_tokens (
    subscriber_id TEXT NOT NULL REFERENCES subscribers(subscriber_id),
    token         TEXT NOT NULL,
    registered_at TEXT NOT NULL,
    UNIQUE (subscriber_id, token)
);

-- One row per followed artist, keyed by roster username.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscriber_id   TEXT NOT NULL REFERENCES subscribers(subscriber_id),
    artist_username TEXT NOT NULL,
    subscribed_at   TEXT NOT NULL,
    UNIQUE (subscriber_id, artist_username)
);

CREATE INDEX IF NOT EXISTS subscribers_enabled_idx   ON subscribers(notifications_enabled);
CREATE INDEX IF NOT EXISTS subscriptions_artist_idx  ON subscriptions(artist_username);

PRAGMA user_version = 1;
";
