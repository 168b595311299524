pub mod http_client;
pub mod http_handler;

/// Re-export commonly used types from adapters
pub use http_client::HttpClientAdapter;
pub use http_handler::{HttpHandler, build_router};
