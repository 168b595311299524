use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// HTTP client adapter using Hyper with Rustls (HTTP/1.1 + HTTP/2).
///
/// Responsibilities:
/// * Applies the configured per-request timeout to every outbound call
/// * Forces request version to HTTP/1.1 while allowing ALPN to negotiate h2
/// * Converts between Hyper body and Axum body types
///
/// One instance is created at startup and shared by all request handlers; the
/// connection pool inside is reused across requests. The adapter never adds
/// or strips payload headers — the pipeline's header contracts stay intact.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    request_timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter with the given per-request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::info!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        tracing::info!(
            "Created new HTTP client (timeout {}ms) with HTTP/2 and HTTP/1.1 support",
            request_timeout.as_millis()
        );
        Ok(Self {
            client,
            request_timeout,
        })
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        let client = self.client.clone();

        let upstream_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );
        let request_path = req.uri().path().to_string();
        let request_method = req.method().to_string();

        let span = tracing::info_span!(
            "upstream_request",
            upstream.url = %upstream_identifier,
            http.method = %request_method,
            http.path = %request_path,
            http.status_code = tracing::field::Empty,
        );

        // The Host header follows the outgoing URI, same as the inbound
        // client's Host never names the upstream.
        if let Some(host_str) = req.uri().host() {
            let host_header_val = if let Some(port) = req.uri().port() {
                HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16()))
                    .unwrap_or_else(|_| HeaderValue::from_static(""))
            } else {
                HeaderValue::from_str(host_str).unwrap_or_else(|_| HeaderValue::from_static(""))
            };
            if !host_header_val.is_empty() {
                req.headers_mut()
                    .insert(hyper::header::HOST, host_header_val);
            }
        } else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        }

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        tracing::debug!("Outgoing request headers: {:?}", parts.headers);

        let outgoing_request = Request::from_parts(parts, axum_body);

        let method_for_error_log = outgoing_request.method().clone();
        let uri_for_error_log = outgoing_request.uri().clone();

        match timeout(self.request_timeout, client.request(outgoing_request))
            .instrument(span.clone())
            .await
        {
            Ok(Ok(response)) => {
                let status_code = response.status().as_u16();
                span.record("http.status_code", status_code);

                let (mut parts, hyper_body) = response.into_parts();

                // Remove Transfer-Encoding header since the body is being
                // decoded/streamed and the server side will handle framing.
                parts.headers.remove(header::TRANSFER_ENCODING);

                let axum_body = AxumBody::new(hyper_body);

                Ok(Response::from_parts(parts, axum_body))
            }
            Ok(Err(e)) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Error making request to upstream {} ({} {}): {}",
                    upstream_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );

                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
                )))
            }
            Err(_) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Request to upstream {} ({} {}) timed out after {}ms",
                    upstream_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    self.request_timeout.as_millis()
                );

                Err(HttpClientError::Timeout(
                    self.request_timeout.as_millis() as u64
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClientAdapter::new(Duration::from_millis(500));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_request_without_host_is_invalid() {
        let client = HttpClientAdapter::new(Duration::from_millis(500)).unwrap();
        let req = Request::builder()
            .uri("/no-host")
            .body(AxumBody::empty())
            .unwrap();

        match client.send_request(req).await {
            Err(HttpClientError::InvalidRequest(_)) => {}
            Err(e) => panic!("Expected InvalidRequest, got {e:?}"),
            Ok(_) => panic!("Expected InvalidRequest, got a response"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_connection_error() {
        let client = HttpClientAdapter::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) is assumed closed
        let req = Request::builder()
            .uri("http://127.0.0.1:9/")
            .body(AxumBody::empty())
            .unwrap();

        match client.send_request(req).await {
            Err(HttpClientError::ConnectionError(_) | HttpClientError::Timeout(_)) => {}
            Err(e) => panic!("Expected transport failure, got {e:?}"),
            Ok(_) => panic!("Expected transport failure, got a response"),
        }
    }
}
