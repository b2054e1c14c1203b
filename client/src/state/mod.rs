//! Client-side state shared across pages.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` owns the logged-in user, `profile_cache` persists it between runs,
//! and `page` holds the loading/error/empty/loaded shape every page renders.

pub mod auth;
pub mod page;
pub mod profile_cache;
