//! HTTP and WebSocket transport.

pub mod admission;
pub mod error;
pub mod guard;
mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, ServerConfig, build_router};
