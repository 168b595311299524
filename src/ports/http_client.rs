use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for outbound HTTP operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when the connection to the upstream fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when the request exceeds the configured client timeout
    #[error("Timeout error after {0} ms")]
    Timeout(u64),

    /// Error when the request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for outbound HTTP operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for the auth and backend legs.
///
/// Both outbound round trips of the pipeline go through this trait, which
/// keeps the core testable with a scripted client and keeps the shared
/// connection pool behind a single seam.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to an upstream server
    ///
    /// # Arguments
    /// * `req` - The HTTP request to send
    ///
    /// # Returns
    /// A future that resolves to the upstream's response or an error
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
