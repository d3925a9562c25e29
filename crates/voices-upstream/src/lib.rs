//! HTTP clients for the services a Voices deployment talks to.
//!
//! - [`AirtimeSchedule`]: the station's weekly programme.
//! - [`MixcloudDirectory`]: the roster of resident hosts.
//! - [`ExpoGateway`]: push delivery to subscriber devices.
//!
//! Each implements the matching collaborator trait from
//! [`voices_core::source`].

pub mod airtime;
pub mod error;
pub mod expo;
pub mod mixcloud;

mod http;

#[cfg(test)]
mod testing;

pub use airtime::AirtimeSchedule;
pub use error::{Error, Result};
pub use expo::ExpoGateway;
pub use mixcloud::MixcloudDirectory;
