//! Per-request decision pipeline.
//!
//! The `ProxyService` ties the resolver, whitelist and header policies
//! together over the `HttpClient` port: resolve the prefix (fail fast with
//! 400), check the whitelist, run the auth round trip unless bypassed, then
//! forward to the backend and stream its response back.
//!
//! Terminal outcomes per request are always one of 400 (unresolved prefix),
//! 500 (transport failure on either leg), 401 (auth rejected) or the
//! upstream's own status on the success path. Every failure is terminal for
//! its request; there are no retries.
//!
//! The three header-copy rules are intentionally different and must not be
//! unified: the preflight leg filters client headers through the request
//! policy, the standard auth leg copies client headers unfiltered, and the
//! backend leg copies client headers unfiltered plus an auth-response overlay
//! filtered through the authorization policy.
use std::sync::Arc;

use axum::body::Body;
use eyre::{Result, WrapErr};
use http::{HeaderMap, Method, StatusCode, request::Parts};
use hyper::{Request, Response};

use crate::{
    config::models::GatewayConfig,
    core::{
        header_policy::HeaderPolicy,
        resolver::{ResolveError, TargetTable},
    },
    ports::http_client::HttpClient,
};

/// Outcome of the standard auth sub-protocol.
enum AuthOutcome {
    /// Auth returned 200; these response headers feed the backend overlay.
    Passed(HeaderMap),
    /// The pipeline terminates with this response (rejection or transport failure).
    Respond(Response<Body>),
}

/// Central per-request orchestrator. Cheap to share behind an `Arc`; all of
/// its state is immutable after construction except the policy memo caches.
pub struct ProxyService {
    targets: TargetTable,
    auth_url: String,
    request_policy: HeaderPolicy,
    authorization_policy: HeaderPolicy,
    http_client: Arc<dyn HttpClient>,
}

impl ProxyService {
    /// Build the service from a validated configuration: compiles every
    /// mapping's whitelist and constructs both header policies up front so
    /// the hot path avoids allocation.
    pub fn new(config: Arc<GatewayConfig>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            targets: TargetTable::from_config(&config),
            auth_url: config.auth.url.clone(),
            request_policy: HeaderPolicy::request_direction(&config.auth.allowed_request_headers),
            authorization_policy: HeaderPolicy::authorization_direction(
                &config.auth.allowed_authorization_headers,
            ),
            http_client,
        }
    }

    /// Number of resolvable prefixes (startup diagnostics).
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Run one request through the pipeline.
    ///
    /// `Err` is reserved for response construction failures; every expected
    /// outcome (including 4xx/5xx) is an `Ok` response.
    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>> {
        let (parts, body) = req.into_parts();
        let original = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

        let (target, remainder) = match self.targets.resolve(&original) {
            Ok(resolved) => resolved,
            Err(ResolveError::PrefixNotFound { prefix }) => {
                tracing::debug!(prefix = %prefix, "No mapping for request prefix");
                return text_response(
                    StatusCode::BAD_REQUEST,
                    format!("Prefix \"{prefix}\" not found in mappings"),
                );
            }
        };

        let bypass = target.whitelist.is_bypassed(remainder);
        tracing::debug!(
            method = %parts.method,
            path = %original,
            forward = %target.forward,
            bypass,
            "Resolved request"
        );

        // A non-bypassed OPTIONS terminates at the auth service; the backend
        // is never contacted for it.
        if parts.method == Method::OPTIONS && !bypass {
            return self.auth_preflight(&parts, remainder).await;
        }

        let auth_headers = if bypass {
            None
        } else {
            match self.authenticate(&parts, remainder).await? {
                AuthOutcome::Passed(headers) => Some(headers),
                AuthOutcome::Respond(response) => return Ok(response),
            }
        };

        self.forward(parts, body, &target.forward, remainder, auth_headers)
            .await
    }

    /// Preflight sub-protocol: `OPTIONS` to the auth endpoint carrying only
    /// request-policy-allowed headers, no body. The auth response (status and
    /// all of its headers, body dropped) IS the final client response.
    async fn auth_preflight(&self, parts: &Parts, remainder: &str) -> Result<Response<Body>> {
        let uri = format!("{}{}", self.auth_url, remainder);
        let mut auth_req = match Request::builder()
            .method(Method::OPTIONS)
            .uri(&uri)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        for (name, value) in &parts.headers {
            if self.request_policy.is_allowed(name.as_str()).await {
                auth_req.headers_mut().insert(name.clone(), value.clone());
            }
        }

        let auth_resp = match self.http_client.send_request(auth_req).await {
            Ok(resp) => resp,
            Err(e) => return text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let (resp_parts, _auth_body) = auth_resp.into_parts();
        Ok(Response::from_parts(resp_parts, Body::empty()))
    }

    /// Standard sub-protocol: same method to the auth endpoint, empty body,
    /// ALL client headers copied through unfiltered. A non-200 comes back to
    /// the caller as 401 with the auth response's headers and body; a 200
    /// yields the header set for the backend overlay.
    async fn authenticate(&self, parts: &Parts, remainder: &str) -> Result<AuthOutcome> {
        let uri = format!("{}{}", self.auth_url, remainder);
        let mut auth_req = match Request::builder()
            .method(parts.method.clone())
            .uri(&uri)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                return Ok(AuthOutcome::Respond(
                    text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())?,
                ));
            }
        };
        *auth_req.headers_mut() = parts.headers.clone();

        let auth_resp = match self.http_client.send_request(auth_req).await {
            Ok(resp) => resp,
            Err(e) => {
                return Ok(AuthOutcome::Respond(
                    text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())?,
                ));
            }
        };

        if auth_resp.status() != StatusCode::OK {
            tracing::debug!(status = %auth_resp.status(), "Auth service rejected request");
            let (mut resp_parts, resp_body) = auth_resp.into_parts();
            resp_parts.status = StatusCode::UNAUTHORIZED;
            return Ok(AuthOutcome::Respond(Response::from_parts(
                resp_parts, resp_body,
            )));
        }

        let (resp_parts, _resp_body) = auth_resp.into_parts();
        Ok(AuthOutcome::Passed(resp_parts.headers))
    }

    /// Backend leg: original method, headers and body to the resolved target,
    /// plus the authorization-policy-filtered overlay when auth ran. The
    /// backend's status, headers and body stream back verbatim.
    async fn forward(
        &self,
        parts: Parts,
        body: Body,
        forward_url: &str,
        remainder: &str,
        auth_headers: Option<HeaderMap>,
    ) -> Result<Response<Body>> {
        let uri = format!("{forward_url}{remainder}");
        let mut out_req = match Request::builder()
            .method(parts.method.clone())
            .uri(&uri)
            .body(body)
        {
            Ok(req) => req,
            Err(e) => return text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        *out_req.headers_mut() = parts.headers.clone();

        if let Some(auth_headers) = auth_headers {
            for (name, value) in &auth_headers {
                if self.authorization_policy.is_allowed(name.as_str()).await {
                    out_req.headers_mut().insert(name.clone(), value.clone());
                }
            }
        }

        match self.http_client.send_request(out_req).await {
            Ok(resp) => Ok(resp),
            Err(e) => text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .body(Body::from(body.into()))
        .wrap_err("Failed to build response")
}
