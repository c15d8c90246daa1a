use std::sync::Arc;
use std::time::Instant;
use arc_swap::ArcSwap;
use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use tracing::{debug, error};
use uuid::Uuid;

use crate::logging::RequestLog;
use crate::middleware::{
    full_body, handle_middleware_error, ClientInfo, MiddlewareManager, Request, Response,
};
use crate::proxy::{self, ProxyConfig};
use crate::registry::ServiceRegistry;
use crate::router::{RouterError, SharedRouterTable};

/// 요청 하나를 라우팅 → 미들웨어 → 전달 순서로 처리합니다.
pub struct RequestHandler {
    table: Arc<SharedRouterTable>,
    registry: Arc<ServiceRegistry>,
    middleware: Arc<ArcSwap<MiddlewareManager>>,
    proxy_config: ProxyConfig,
}

impl RequestHandler {
    pub fn new(
        table: Arc<SharedRouterTable>,
        registry: Arc<ServiceRegistry>,
        middleware: Arc<ArcSwap<MiddlewareManager>>,
        proxy_config: ProxyConfig,
    ) -> Self {
        Self {
            table,
            registry,
            middleware,
            proxy_config,
        }
    }

    pub async fn handle_request(
        &self,
        req: hyper::Request<hyper::body::Incoming>,
        client: ClientInfo,
    ) -> Result<Response, std::convert::Infallible> {
        let mut req: Request = req.map(|body| BodyExt::boxed(body));
        let started = Instant::now();
        let mut log = RequestLog::new(Uuid::new_v4().to_string());
        log.with_request(&req);
        req.extensions_mut().insert(client);

        // 1. 라우팅: 요청은 로드 시점의 스냅샷 하나만 봄
        let table = self.table.load();
        let route = match table.match_request(&req) {
            Ok(route) => route,
            Err(e) => {
                let response = routing_error_response(&e);
                log.with_error(&e);
                log.with_response(response.status());
                log.duration_ms = started.elapsed().as_millis() as u64;
                log.emit();
                return Ok(response);
            }
        };
        log.with_route(&route.id);
        debug!(route = %route.id, service = %route.service, "미들웨어 체인 시작");

        // 2. 요청 미들웨어: 중단 에러는 백엔드 호출 없이 터미널 응답이 됨
        let manager = self.middleware.load_full();
        let req = match manager.handle_request(Some(&route.id), req).await {
            Ok(req) => req,
            Err(e) => {
                let response = handle_middleware_error(e);
                log.with_response(response.status());
                log.duration_ms = started.elapsed().as_millis() as u64;
                log.emit();
                return Ok(response);
            }
        };

        // 3. 전달: 실패는 상태 코드로 변환되고 이 요청에만 영향을 줌
        let response = match proxy::forward(
            &self.proxy_config,
            &self.registry,
            &route.service,
            req,
        ).await {
            Ok(response) => response,
            Err(e) => {
                let response = proxy::error_response(&e);
                log.with_error(&e);
                log.with_response(response.status());
                log.duration_ms = started.elapsed().as_millis() as u64;
                log.emit();
                return Ok(response);
            }
        };

        // 4. 응답 미들웨어
        let response = match manager.handle_response(Some(&route.id), response).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, route = %route.id, "응답 미들웨어 처리 실패");
                handle_middleware_error(e)
            }
        };

        log.with_response(response.status());
        log.duration_ms = started.elapsed().as_millis() as u64;
        log.emit();
        Ok(response)
    }

    pub async fn handle_connection<I>(
        &self,
        io: I,
        client: ClientInfo,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(io, service_fn(move |req| self.handle_request(req, client)))
            .await
            .map_err(|e| e.into())
    }
}

fn routing_error_response(error: &RouterError) -> Response {
    let status = match error {
        RouterError::MissingHost
        | RouterError::InvalidHost { .. }
        | RouterError::InvalidPort { .. }
        | RouterError::HeaderParseError { .. } => StatusCode::BAD_REQUEST,
        RouterError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
    };

    hyper::Response::builder()
        .status(status)
        .body(full_body(format!("Error: {}", error)))
        .unwrap_or_else(|e| {
            error!(error = %e, "에러 응답 생성 실패");
            let mut response = Response::new(full_body("Internal Server Error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}
