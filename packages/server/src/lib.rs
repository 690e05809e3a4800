//! Engawa relay: chat rooms with live streaming fan-out.
//!
//! Layers:
//! - `domain`: entities, value objects and the traits the use cases depend on
//! - `usecase`: one struct per API operation
//! - `infrastructure`: room engine, store, authorization client, metrics, DTOs
//! - `ui`: axum router, access guard and handlers

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
