//! Environment - the surface a rendering layer uses.
//!
//! Ties the store, the computed-field registry, the subscription channel, the
//! network function and the query cache together:
//!
//! - [`Environment::write`] normalizes a response and notifies subscribers.
//! - [`Environment::read`] returns [`ReadOutcome::Ready`] or
//!   [`ReadOutcome::Pending`] with a [`NextChange`](crate::NextChange) to await.
//! - [`Environment::fetch`] deduplicates identical requests and retains the
//!   query's data for as long as the returned pointer lives.
//! - [`Environment::garbage_collect`] drops records no live query reaches.

mod config;
mod entrypoint;
mod environment;
mod error;
mod network;

pub use config::EnvironmentConfig;
pub use entrypoint::Entrypoint;
pub use environment::{Environment, ReadOutcome};
pub use error::EnvironmentError;
pub use network::{NetworkFunction, NetworkRequest, NetworkResponse};
