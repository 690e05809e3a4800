//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: frames pushed on a connect stream
//! - `http`: HTTP API request and response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
