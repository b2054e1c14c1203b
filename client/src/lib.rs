//! # vidshare-client
//!
//! Client-side layer of the vidshare video platform: typed REST client,
//! cookie-backed session handling with transparent token refresh, the auth
//! store, and page-level loaders that turn API calls into renderable state.
//!
//! Rendering is left to the front end (`vidshare-cli` in this workspace).

pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;
