use std::collections::HashMap;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use edge_gateway::middleware::{
    full_body, handle_middleware_error, ClientInfo, MiddlewareConfig, MiddlewareError,
    MiddlewareManager, MiddlewareType, Request,
};
use hyper::{header, Method, StatusCode};
use serde_json::json;

fn middleware_config(
    middleware_type: MiddlewareType,
    settings: &[(&str, &str)],
) -> MiddlewareConfig {
    MiddlewareConfig {
        middleware_type,
        enabled: true,
        order: 0,
        settings: settings.iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect(),
    }
}

fn manager_with(
    name: &str,
    config: MiddlewareConfig,
    router: &str,
) -> MiddlewareManager {
    let mut configs = HashMap::new();
    configs.insert(name.to_string(), config);
    let mut router_middlewares = HashMap::new();
    router_middlewares.insert(router.to_string(), vec![name.to_string()]);
    MiddlewareManager::new(&configs, &router_middlewares).unwrap()
}

fn request(path: &str) -> Request {
    hyper::Request::builder()
        .method(Method::GET)
        .uri(path)
        .header("Host", "app.example.com")
        .body(full_body(""))
        .unwrap()
}

fn client_info() -> ClientInfo {
    ClientInfo {
        peer_addr: "10.1.2.3:52000".parse().unwrap(),
        scheme: "https",
    }
}

#[tokio::test]
async fn test_basic_auth_rejects_missing_credentials() {
    let hash = bcrypt::hash("secret", 4).unwrap();
    let config = middleware_config(
        MiddlewareType::BasicAuth,
        &[("basicAuth.users", &format!("admin:{}", hash))],
    );
    let manager = manager_with("auth", config, "api");

    let result = manager.handle_request(Some("api"), request("/")).await;
    let err = result.err().expect("인증 없는 요청은 거부되어야 함");

    let response = handle_middleware_error(err);
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_basic_auth_accepts_valid_credentials() {
    let hash = bcrypt::hash("secret", 4).unwrap();
    let config = middleware_config(
        MiddlewareType::BasicAuth,
        &[("basicAuth.users", &format!("admin:{}", hash))],
    );
    let manager = manager_with("auth", config, "api");

    let credentials = BASE64.encode("admin:secret");
    let mut req = request("/");
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Basic {}", credentials).parse().unwrap(),
    );

    assert!(manager.handle_request(Some("api"), req).await.is_ok());
}

#[tokio::test]
async fn test_rate_limit_burst_then_recovery() {
    // burst=5, rate=1/초
    let config = middleware_config(
        MiddlewareType::RateLimit,
        &[("rateLimit.average", "1"), ("rateLimit.burst", "5")],
    );
    let manager = manager_with("limit", config, "api");

    // 버스트 한도까지는 통과
    for i in 0..5 {
        let result = manager.handle_request(Some("api"), request("/")).await;
        assert!(result.is_ok(), "{}번째 요청은 통과해야 함", i + 1);
    }

    // 6번째는 429
    let err = manager.handle_request(Some("api"), request("/")).await
        .err()
        .expect("버스트 초과 요청은 거부되어야 함");
    assert!(matches!(err, MiddlewareError::TooManyRequests { limit: 1, .. }));
    let response = handle_middleware_error(err);
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // 1초 대기 후 토큰이 보충되어 하나 더 통과
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(manager.handle_request(Some("api"), request("/")).await.is_ok());
}

#[tokio::test]
async fn test_rate_limit_keys_clients_separately() {
    let config = middleware_config(
        MiddlewareType::RateLimit,
        &[("rateLimit.average", "1"), ("rateLimit.burst", "1")],
    );
    let manager = manager_with("limit", config, "api");

    let mut first = request("/");
    first.headers_mut().insert("x-forwarded-for", "10.0.0.1".parse().unwrap());
    assert!(manager.handle_request(Some("api"), first).await.is_ok());

    let mut first_again = request("/");
    first_again.headers_mut().insert("x-forwarded-for", "10.0.0.1".parse().unwrap());
    assert!(manager.handle_request(Some("api"), first_again).await.is_err());

    // 다른 클라이언트는 독립적인 버킷을 사용
    let mut second = request("/");
    second.headers_mut().insert("x-forwarded-for", "10.0.0.2".parse().unwrap());
    assert!(manager.handle_request(Some("api"), second).await.is_ok());
}

#[tokio::test]
async fn test_strip_prefix_rewrites_path() {
    let config = middleware_config(
        MiddlewareType::StripPrefix,
        &[("stripPrefix.prefixes", "/api")],
    );
    let manager = manager_with("strip", config, "api");

    let req = manager.handle_request(Some("api"), request("/api/users?page=2")).await.unwrap();
    assert_eq!(req.uri().path(), "/users");
    assert_eq!(req.uri().query(), Some("page=2"));
    assert_eq!(req.headers().get("x-forwarded-prefix").unwrap(), "/api");
}

#[tokio::test]
async fn test_headers_injects_forwarded_headers() {
    let config = middleware_config(MiddlewareType::Headers, &[]);
    let manager = manager_with("headers", config, "api");

    let mut req = request("/");
    req.extensions_mut().insert(client_info());

    let req = manager.handle_request(Some("api"), req).await.unwrap();
    assert_eq!(req.headers().get("x-forwarded-for").unwrap(), "10.1.2.3");
    assert_eq!(req.headers().get("x-forwarded-proto").unwrap(), "https");
    assert_eq!(req.headers().get("x-forwarded-host").unwrap(), "app.example.com");
}

#[tokio::test]
async fn test_headers_sets_custom_response_header() {
    let config = middleware_config(
        MiddlewareType::Headers,
        &[("headers.customResponseHeaders.X-Served-By", "edge-gateway")],
    );
    let manager = manager_with("headers", config, "api");

    let response = hyper::Response::builder()
        .status(StatusCode::OK)
        .body(full_body("ok"))
        .unwrap();

    let response = manager.handle_response(Some("api"), response).await.unwrap();
    assert_eq!(response.headers().get("x-served-by").unwrap(), "edge-gateway");
}

#[tokio::test]
async fn test_cors_preflight_short_circuits() {
    let config = middleware_config(
        MiddlewareType::Cors,
        &[("cors.allowOrigins", "https://app.example.com")],
    );
    let manager = manager_with("cors", config, "api");

    let mut req = hyper::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/users")
        .header("Host", "api.example.com")
        .body(full_body(""))
        .unwrap();
    req.headers_mut().insert(header::ORIGIN, "https://app.example.com".parse().unwrap());
    req.headers_mut().insert(
        header::ACCESS_CONTROL_REQUEST_METHOD,
        "POST".parse().unwrap(),
    );

    let err = manager.handle_request(Some("api"), req).await
        .err()
        .expect("preflight는 체인에서 종결되어야 함");

    let response = handle_middleware_error(err);
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_cors_rejects_forbidden_origin() {
    let config = middleware_config(
        MiddlewareType::Cors,
        &[("cors.allowOrigins", "https://app.example.com")],
    );
    let manager = manager_with("cors", config, "api");

    let mut req = request("/");
    req.headers_mut().insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let err = manager.handle_request(Some("api"), req).await.err().unwrap();
    let response = handle_middleware_error(err);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chain_applies_in_declared_order() {
    let mut configs = HashMap::new();
    configs.insert(
        "strip".to_string(),
        middleware_config(MiddlewareType::StripPrefix, &[("stripPrefix.prefixes", "/api")]),
    );
    configs.insert(
        "mark".to_string(),
        middleware_config(
            MiddlewareType::Headers,
            &[("headers.customRequestHeaders.X-Rewritten", "yes")],
        ),
    );

    let mut router_middlewares = HashMap::new();
    router_middlewares.insert(
        "api".to_string(),
        vec!["strip".to_string(), "mark".to_string()],
    );
    let manager = MiddlewareManager::new(&configs, &router_middlewares).unwrap();

    let req = manager.handle_request(Some("api"), request("/api/users")).await.unwrap();
    assert_eq!(req.uri().path(), "/users");
    assert_eq!(req.headers().get("x-rewritten").unwrap(), "yes");
}

#[tokio::test]
async fn test_unknown_middleware_reference_rejected() {
    let configs = HashMap::new();
    let mut router_middlewares = HashMap::new();
    router_middlewares.insert("api".to_string(), vec!["ghost".to_string()]);

    assert!(MiddlewareManager::new(&configs, &router_middlewares).is_err());
}

#[tokio::test]
async fn test_request_without_chain_passes_through() {
    let manager = MiddlewareManager::new(&HashMap::new(), &HashMap::new()).unwrap();
    let req = manager.handle_request(Some("unknown-router"), request("/x")).await.unwrap();
    assert_eq!(req.uri().path(), "/x");
}
