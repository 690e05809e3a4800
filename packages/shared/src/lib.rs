//! Utilities shared by the Engawa relay crates: logging setup and time helpers.

pub mod logger;
pub mod time;
