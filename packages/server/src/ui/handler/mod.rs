//! Request handlers.

mod http;
mod websocket;

pub use http::{create_chat, delete_chat, get_chat, health_check, metrics, send_message};
pub use websocket::connect_handler;
