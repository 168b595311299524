use std::{convert::Infallible, sync::Arc};

use axum::{Router, body::Body, extract::Request, response::Response, routing::any};
use eyre::Result;

use crate::core::ProxyService;

/// HTTP handler for the Authgate reverse proxy.
///
/// Thin adapter between the axum server surface and the core pipeline; all
/// routing and auth decisions live in [`ProxyService`].
pub struct HttpHandler {
    proxy_service: Arc<ProxyService>,
}

impl HttpHandler {
    pub fn new(proxy_service: Arc<ProxyService>) -> Self {
        Self { proxy_service }
    }

    /// Run a single request through the pipeline.
    pub async fn handle_request(&self, req: Request<Body>) -> Result<Response<Body>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::info!("Handling {} request to {}", method, path);

        self.proxy_service.handle(req).await
    }
}

impl Clone for HttpHandler {
    fn clone(&self) -> Self {
        Self {
            proxy_service: self.proxy_service.clone(),
        }
    }
}

/// Build the axum router: every path, every method, one pipeline.
pub fn build_router(handler: Arc<HttpHandler>) -> Router {
    let make_request_route = |handler: Arc<HttpHandler>| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move {
                match handler.handle_request(req).await {
                    Ok(response) => Ok::<Response<Body>, Infallible>(response),
                    Err(e) => {
                        tracing::error!("Request handling error: {:?}", e);
                        let error_response = Response::builder()
                            .status(500)
                            .body(Body::from("Internal Server Error"))
                            .unwrap_or_else(|_| {
                                Response::new(Body::from("Internal Server Error"))
                            });
                        Ok(error_response)
                    }
                }
            }
        })
    };

    Router::new()
        .route("/{*path}", make_request_route(handler.clone()))
        .route("/", make_request_route(handler))
}
