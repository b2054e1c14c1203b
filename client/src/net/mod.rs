//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` performs single HTTP calls, `session` wraps them with
//! transparent token refresh, and `api` exposes one typed method per backend
//! endpoint. `envelope` and `types` define how responses are read.

pub mod api;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
