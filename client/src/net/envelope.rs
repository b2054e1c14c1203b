//! Response interpretation: status checks, error messages, payload lookup.
//!
//! DESIGN
//! ======
//! The backend is not consistent about where it puts payloads. Some listing
//! endpoints answer `{ "videos": [...] }`, others `{ "data": { "history": [...] } }`,
//! and a few return the record directly as `data`. Lookups therefore try the
//! top level, then `data.<key>`, then `data` itself.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, DEFAULT_ERROR_MESSAGE};
use super::types::Envelope;

/// A response as seen by the transport, before status interpretation.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
}

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
