use std::sync::Arc;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::middleware::{full_body, Response};
use crate::registry::ServiceRegistry;
use crate::router::SharedRouterTable;

/// 읽기 전용 관리 엔드포인트입니다.
///
/// 현재 활성 라우팅 테이블과 서비스 레지스트리 상태를 JSON으로
/// 노출합니다. 운영자가 적용된 설정을 검증하는 용도이며 상태를
/// 변경하는 경로는 없습니다.
pub struct AdminHandler {
    table: Arc<SharedRouterTable>,
    registry: Arc<ServiceRegistry>,
}

impl AdminHandler {
    pub fn new(table: Arc<SharedRouterTable>, registry: Arc<ServiceRegistry>) -> Self {
        Self { table, registry }
    }

    pub async fn handle_request<B>(
        &self,
        req: hyper::Request<B>,
    ) -> Result<Response, std::convert::Infallible> {
        if req.method() != Method::GET {
            return Ok(status_response(StatusCode::METHOD_NOT_ALLOWED, "GET only"));
        }

        debug!(path = %req.uri().path(), "관리 엔드포인트 조회");

        let response = match req.uri().path() {
            "/api/version" => self.version(),
            "/api/routers" => self.routers(),
            "/api/services" => self.services(),
            _ => status_response(StatusCode::NOT_FOUND, "Not Found"),
        };

        Ok(response)
    }

    fn version(&self) -> Response {
        json_response(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "table_version": self.table.version(),
        }))
    }

    fn routers(&self) -> Response {
        let table = self.table.load();
        let routers: Vec<_> = table.routes().iter()
            .map(|route| json!({
                "id": route.id,
                "rule": route.rule.expression(),
                "service": route.service,
                "middlewares": route.middlewares,
                "priority": route.priority,
            }))
            .collect();

        json_response(json!({
            "version": table.version(),
            "routers": routers,
        }))
    }

    fn services(&self) -> Response {
        let services: Vec<_> = self.registry.snapshot().iter()
            .map(|service| json!({
                "name": service.name,
                "strategy": service.strategy,
                "healthy_instances": service.healthy_count(),
                "instances": service.instances().iter()
                    .map(|instance| json!({
                        "address": instance.address.to_string(),
                        "weight": instance.weight,
                        "healthy": instance.is_healthy(),
                        "consecutive_failures": instance.failure_count(),
                    }))
                    .collect::<Vec<_>>(),
            }))
            .collect();

        json_response(json!({ "services": services }))
    }

    pub async fn handle_connection<I>(
        &self,
        io: I,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(io, service_fn(move |req| self.handle_request(req)))
            .await
            .map_err(|e| e.into())
    }
}

fn json_response(value: serde_json::Value) -> Response {
    hyper::Response::builder()
        .status(StatusCode::OK)
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(full_body(value.to_string()))
        .unwrap_or_else(|_| status_response(StatusCode::INTERNAL_SERVER_ERROR, "encode error"))
}

fn status_response(status: StatusCode, message: &str) -> Response {
    let mut response = Response::new(full_body(message.to_string()));
    *response.status_mut() = status;
    response
}
