//! Core types, collaborator traits, and the upcoming-show notifier.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! schedule service, artist roster, subscriber store, and push gateway are
//! reached only through the traits in [`source`]; concrete clients live in
//! `voices-upstream` and `voices-store-sqlite`.

pub mod artist;
pub mod countdown;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod notifier;
pub mod push;
pub mod schedule;
pub mod source;
pub mod subscriber;

pub use error::{Error, Result};
