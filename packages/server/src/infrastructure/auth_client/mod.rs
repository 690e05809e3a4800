//! Authorization service clients

mod http;

pub use http::HttpAuthService;
