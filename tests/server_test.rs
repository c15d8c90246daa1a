use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use edge_gateway::middleware::{ClientInfo, MiddlewareConfig, MiddlewareManager, MiddlewareType};
use edge_gateway::proxy::ProxyConfig;
use edge_gateway::registry::{Instance, ServiceRegistry};
use edge_gateway::router::{RouteDefinition, RouterTable, SharedRouterTable};
use edge_gateway::server::RequestHandler;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;

/// 수신한 경로와 전달 헤더를 본문으로 돌려주는 백엔드를 띄웁니다.
async fn spawn_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req: hyper::Request<Incoming>| async move {
                    let forwarded_for = req.headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let forwarded_proto = req.headers()
                        .get("x-forwarded-proto")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let body = json!({
                        "backend": name,
                        "path": req.uri().path(),
                        "forwarded_for": forwarded_for,
                        "forwarded_proto": forwarded_proto,
                    });
                    Ok::<_, std::convert::Infallible>(
                        hyper::Response::new(Full::new(Bytes::from(body.to_string()))),
                    )
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    addr
}

/// 핸들러를 실제 리스너 뒤에 붙여 게이트웨이를 띄웁니다.
async fn spawn_gateway(handler: Arc<RequestHandler>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, peer_addr)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let client = ClientInfo {
                    peer_addr,
                    scheme: "http",
                };
                let _ = handler.handle_connection(io, client).await;
            });
        }
    });

    addr
}

struct GatewayFixture {
    registry: Arc<ServiceRegistry>,
    addr: SocketAddr,
}

async fn gateway_with(
    routes: Vec<RouteDefinition>,
    backends: &[(&str, SocketAddr)],
    middleware_configs: HashMap<String, MiddlewareConfig>,
) -> GatewayFixture {
    let registry = Arc::new(ServiceRegistry::new());
    for (service, addr) in backends {
        registry.register(service, Instance::new(*addr, 1)).unwrap();
    }

    let router_middlewares: HashMap<String, Vec<String>> = routes.iter()
        .filter(|route| !route.middlewares.is_empty())
        .map(|route| (route.id.clone(), route.middlewares.clone()))
        .collect();
    let manager = MiddlewareManager::new(&middleware_configs, &router_middlewares).unwrap();

    let known_services: HashSet<String> = backends.iter()
        .map(|(service, _)| service.to_string())
        .collect();
    let known_middlewares = manager.middleware_names();
    let table = RouterTable::build(1, &routes, &known_services, &known_middlewares).unwrap();

    let handler = Arc::new(RequestHandler::new(
        Arc::new(SharedRouterTable::new(table)),
        registry.clone(),
        Arc::new(ArcSwap::from_pointee(manager)),
        ProxyConfig::default(),
    ));

    let addr = spawn_gateway(handler).await;
    GatewayFixture { registry, addr }
}

fn route(id: &str, rule: &str, service: &str, middlewares: &[&str]) -> RouteDefinition {
    RouteDefinition {
        id: id.to_string(),
        rule: rule.to_string(),
        service: service.to_string(),
        middlewares: middlewares.iter().map(|s| s.to_string()).collect(),
        priority: None,
    }
}

#[tokio::test]
async fn test_end_to_end_routing_and_forwarding() {
    let backend = spawn_echo_backend("primary").await;
    let fixture = gateway_with(
        vec![route("web", "Host(`app.example.com`)", "web-backend", &[])],
        &[("web-backend", backend)],
        HashMap::new(),
    ).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/hello", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["path"], "/hello");
}

#[tokio::test]
async fn test_unmatched_host_returns_404() {
    let backend = spawn_echo_backend("primary").await;
    let fixture = gateway_with(
        vec![route("web", "Host(`app.example.com`)", "web-backend", &[])],
        &[("web-backend", backend)],
        HashMap::new(),
    ).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/", fixture.addr))
        .header(reqwest::header::HOST, "unknown.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_route_to_downed_service_returns_503() {
    let backend = spawn_echo_backend("primary").await;
    let fixture = gateway_with(
        vec![route("web", "Host(`app.example.com`)", "web-backend", &[])],
        &[("web-backend", backend)],
        HashMap::new(),
    ).await;

    // 모든 인스턴스를 비정상으로 전환
    fixture.registry.mark_health("web-backend", backend, false);

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_headers_middleware_injects_forwarded_headers_end_to_end() {
    let backend = spawn_echo_backend("primary").await;

    let mut configs = HashMap::new();
    configs.insert("fwd".to_string(), MiddlewareConfig {
        middleware_type: MiddlewareType::Headers,
        enabled: true,
        order: 0,
        settings: HashMap::new(),
    });

    let fixture = gateway_with(
        vec![route("web", "Host(`app.example.com`)", "web-backend", &["fwd"])],
        &[("web-backend", backend)],
        configs,
    ).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/check", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["forwarded_proto"], "http");
    assert_eq!(body["forwarded_for"], "127.0.0.1");
}

#[tokio::test]
async fn test_basic_auth_enforced_end_to_end() {
    let backend = spawn_echo_backend("primary").await;

    let hash = bcrypt::hash("secret", 4).unwrap();
    let mut settings = HashMap::new();
    settings.insert("basicAuth.users".to_string(), json!(format!("admin:{}", hash)));

    let mut configs = HashMap::new();
    configs.insert("auth".to_string(), MiddlewareConfig {
        middleware_type: MiddlewareType::BasicAuth,
        enabled: true,
        order: 0,
        settings,
    });

    let fixture = gateway_with(
        vec![route("web", "Host(`app.example.com`)", "web-backend", &["auth"])],
        &[("web-backend", backend)],
        configs,
    ).await;

    let client = reqwest::Client::new();

    let denied = client
        .get(format!("http://{}/private", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 401);

    let allowed = client
        .get(format!("http://{}/private", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .basic_auth("admin", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
}

#[tokio::test]
async fn test_path_specificity_end_to_end() {
    let api_backend = spawn_echo_backend("api").await;
    let web_backend = spawn_echo_backend("web").await;

    let fixture = gateway_with(
        vec![
            route("web", "Host(`app.example.com`)", "web-backend", &[]),
            route("api", "Host(`app.example.com`) && PathPrefix(`/api`)", "api-backend", &[]),
        ],
        &[("web-backend", web_backend), ("api-backend", api_backend)],
        HashMap::new(),
    ).await;

    let client = reqwest::Client::new();

    // /api는 더 구체적인 라우트로
    let response = client
        .get(format!("http://{}/api/users", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["backend"], "api");
    assert_eq!(body["path"], "/api/users");

    // 그 외 경로는 포괄 라우트로
    let response = client
        .get(format!("http://{}/index.html", fixture.addr))
        .header(reqwest::header::HOST, "app.example.com")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["backend"], "web");
}
