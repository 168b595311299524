// End-to-end pipeline tests: a real hyper client against axum mock servers
// standing in for the auth service and the backend target.
#[cfg(test)]
mod test {
    use std::{
        net::SocketAddr,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use authgate::{
        HttpClientAdapter, ProxyService,
        config::models::{AuthConfig, GatewayConfig, Mapping},
        ports::http_client::HttpClient,
    };
    use axum::{
        Router,
        body::Body,
        extract::Request,
        http::{Method, StatusCode},
        response::Response,
        routing::any,
    };
    use http_body_util::BodyExt;

    fn proxy_request(method: Method, uri: &str) -> hyper::Request<Body> {
        hyper::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// Auth service double: 200 + X-User for the good bearer token, 403
    /// otherwise, 204 for OPTIONS.
    async fn spawn_auth_server(hits: Arc<AtomicUsize>) -> SocketAddr {
        let app = Router::new().fallback(any(move |req: Request| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let authorized = req
                    .headers()
                    .get("authorization")
                    .is_some_and(|v| v == "Bearer good");

                if req.method() == Method::OPTIONS {
                    Response::builder()
                        .status(StatusCode::NO_CONTENT)
                        .header("Access-Control-Allow-Origin", "*")
                        .body(Body::empty())
                        .unwrap()
                } else if authorized {
                    Response::builder()
                        .status(StatusCode::OK)
                        .header("X-User", "alice")
                        .header("X-Internal", "do-not-forward")
                        .body(Body::from("granted"))
                        .unwrap()
                } else {
                    Response::builder()
                        .status(StatusCode::FORBIDDEN)
                        .body(Body::from("forbidden"))
                        .unwrap()
                }
            }
        }));
        spawn_server(app).await
    }

    /// Backend double that echoes the identity header it received.
    async fn spawn_backend_server(hits: Arc<AtomicUsize>) -> SocketAddr {
        let app = Router::new().fallback(any(move |req: Request| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let user = req
                    .headers()
                    .get("x-user")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                let internal = req.headers().contains_key("x-internal");
                Response::builder()
                    .status(StatusCode::OK)
                    .header("X-Backend", "reached")
                    .body(Body::from(format!("user={user} internal={internal}")))
                    .unwrap()
            }
        }));
        spawn_server(app).await
    }

    struct Fixture {
        proxy: ProxyService,
        auth_hits: Arc<AtomicUsize>,
        backend_hits: Arc<AtomicUsize>,
    }

    async fn fixture() -> Fixture {
        let auth_hits = Arc::new(AtomicUsize::new(0));
        let backend_hits = Arc::new(AtomicUsize::new(0));
        let auth_addr = spawn_auth_server(auth_hits.clone()).await;
        let backend_addr = spawn_backend_server(backend_hits.clone()).await;

        let config = GatewayConfig {
            auth: AuthConfig {
                url: format!("http://{auth_addr}"),
                allowed_request_headers: vec![],
                allowed_authorization_headers: vec!["X-User".to_string()],
            },
            mappings: vec![Mapping {
                forward: format!("http://{backend_addr}"),
                prefix: "svc".to_string(),
                whitelist: vec!["/public/*".to_string()],
            }],
            ..GatewayConfig::default()
        };

        let client: Arc<dyn HttpClient> =
            Arc::new(HttpClientAdapter::new(Duration::from_secs(5)).unwrap());
        Fixture {
            proxy: ProxyService::new(Arc::new(config), client),
            auth_hits,
            backend_hits,
        }
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn whitelisted_request_bypasses_auth() {
        let fx = fixture().await;

        let req = proxy_request(Method::GET, "/svc/public/health");
        let response = fx.proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Backend").unwrap(), "reached");
        assert_eq!(body_string(response).await, "user=none internal=false");
        assert_eq!(fx.auth_hits.load(Ordering::SeqCst), 0);
        assert_eq!(fx.backend_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_auth_returns_401_without_touching_backend() {
        let fx = fixture().await;

        let req = proxy_request(Method::GET, "/svc/private/data");
        let response = fx.proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "forbidden");
        assert_eq!(fx.auth_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fx.backend_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn accepted_auth_overlays_identity_header() {
        let fx = fixture().await;

        let req = hyper::Request::builder()
            .method(Method::GET)
            .uri("/svc/private/data")
            .header("Authorization", "Bearer good")
            .body(Body::empty())
            .unwrap();
        let response = fx.proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // X-User is allow-listed and must reach the backend; X-Internal is not
        assert_eq!(body_string(response).await, "user=alice internal=false");
        assert_eq!(fx.auth_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fx.backend_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn options_preflight_ends_at_auth() {
        let fx = fixture().await;

        let req = hyper::Request::builder()
            .method(Method::OPTIONS)
            .uri("/svc/private/data")
            .header("Origin", "http://app.local")
            .body(Body::empty())
            .unwrap();
        let response = fx.proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .unwrap(),
            "*"
        );
        assert_eq!(body_string(response).await, "");
        assert_eq!(fx.auth_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fx.backend_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_prefix_touches_nothing() {
        let fx = fixture().await;

        let req = proxy_request(Method::GET, "/nope/x");
        let response = fx.proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Prefix \"nope\" not found in mappings"
        );
        assert_eq!(fx.auth_hits.load(Ordering::SeqCst), 0);
        assert_eq!(fx.backend_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_auth_service_yields_500() {
        let backend_hits = Arc::new(AtomicUsize::new(0));
        let backend_addr = spawn_backend_server(backend_hits.clone()).await;

        // Reserve a port and drop the listener so the auth URL refuses connections
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let config = GatewayConfig {
            auth: AuthConfig {
                url: format!("http://{dead_addr}"),
                ..AuthConfig::default()
            },
            mappings: vec![Mapping {
                forward: format!("http://{backend_addr}"),
                prefix: "svc".to_string(),
                whitelist: vec![],
            }],
            ..GatewayConfig::default()
        };
        let client: Arc<dyn HttpClient> =
            Arc::new(HttpClientAdapter::new(Duration::from_secs(2)).unwrap());
        let proxy = ProxyService::new(Arc::new(config), client);

        let req = proxy_request(Method::GET, "/svc/anything");
        let response = proxy.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend_hits.load(Ordering::SeqCst), 0);
    }
}
