//! Infrastructure layer
//!
//! Concrete implementations of the domain traits plus the wire-level DTOs.

pub mod auth_client;
pub mod broadcast;
pub mod dto;
pub mod metrics;
pub mod rate_limiter;
pub mod repository;
