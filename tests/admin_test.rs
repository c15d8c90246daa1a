use std::collections::HashSet;
use std::sync::Arc;

use edge_gateway::registry::{Instance, ServiceRegistry};
use edge_gateway::router::{RouteDefinition, RouterTable, SharedRouterTable};
use edge_gateway::server::AdminHandler;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode};

fn admin_fixture() -> AdminHandler {
    let routes = vec![RouteDefinition {
        id: "api".to_string(),
        rule: "Host(`api.example.com`) && PathPrefix(`/v1`)".to_string(),
        service: "api-backend".to_string(),
        middlewares: vec!["auth".to_string()],
        priority: None,
    }];
    let services: HashSet<String> = ["api-backend".to_string()].into_iter().collect();
    let middlewares: HashSet<String> = ["auth".to_string()].into_iter().collect();
    let table = RouterTable::build(7, &routes, &services, &middlewares).unwrap();

    let registry = ServiceRegistry::new();
    registry.register("api-backend", Instance::new("10.0.0.5:8080".parse().unwrap(), 2)).unwrap();
    registry.register("api-backend", Instance::new("10.0.0.6:8080".parse().unwrap(), 1)).unwrap();
    registry.mark_health("api-backend", "10.0.0.6:8080".parse().unwrap(), false);

    AdminHandler::new(
        Arc::new(SharedRouterTable::new(table)),
        Arc::new(registry),
    )
}

fn get(path: &str) -> Request<Empty<Bytes>> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Empty::new())
        .unwrap()
}

async fn body_json(response: edge_gateway::middleware::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_version_endpoint() {
    let admin = admin_fixture();

    let response = admin.handle_request(get("/api/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["name"], "edge_gateway");
    assert_eq!(json["table_version"], 7);
}

#[tokio::test]
async fn test_routers_endpoint_exposes_active_table() {
    let admin = admin_fixture();

    let response = admin.handle_request(get("/api/routers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["version"], 7);

    let routers = json["routers"].as_array().unwrap();
    assert_eq!(routers.len(), 1);
    assert_eq!(routers[0]["id"], "api");
    assert_eq!(routers[0]["service"], "api-backend");
    assert_eq!(routers[0]["rule"], "Host(`api.example.com`) && PathPrefix(`/v1`)");
    assert_eq!(routers[0]["middlewares"][0], "auth");
}

#[tokio::test]
async fn test_services_endpoint_exposes_health_state() {
    let admin = admin_fixture();

    let response = admin.handle_request(get("/api/services")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let services = json["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["name"], "api-backend");
    assert_eq!(services[0]["healthy_instances"], 1);

    let instances = services[0]["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 2);

    let unhealthy = instances.iter()
        .find(|i| i["address"] == "10.0.0.6:8080")
        .unwrap();
    assert_eq!(unhealthy["healthy"], false);
}

#[tokio::test]
async fn test_unknown_path_returns_404() {
    let admin = admin_fixture();
    let response = admin.handle_request(get("/api/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutating_method_rejected() {
    let admin = admin_fixture();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/routers")
        .body(Empty::<Bytes>::new())
        .unwrap();

    let response = admin.handle_request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
