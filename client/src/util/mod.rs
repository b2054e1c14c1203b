//! Utility helpers shared across pages and front ends.

pub mod format;
