//! Shared utilities

pub mod hex_dump;
pub mod time;
