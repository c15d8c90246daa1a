use async_trait::async_trait;
use hyper::{header, Method};
use tracing::debug;

use crate::middleware::{Middleware, MiddlewareError, Request, Response};
use super::config::CorsConfig;

/// CORS 미들웨어
///
/// preflight(OPTIONS) 요청은 백엔드 호출 없이 체인에서 종결되고,
/// 일반 요청은 응답 단계에서 CORS 헤더를 얻습니다.
#[derive(Debug)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    fn origin_of(req: &Request) -> Option<String> {
        req.headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    fn name(&self) -> &str {
        "cors"
    }

    async fn handle_request(&self, req: Request) -> Result<Request, MiddlewareError> {
        let Some(origin) = Self::origin_of(&req) else {
            // 브라우저 교차 출처 요청이 아니면 관여하지 않음
            return Ok(req);
        };

        if !self.config.origin_allowed(&origin) {
            return Err(MiddlewareError::ForbiddenOrigin { origin });
        }

        if req.method() == Method::OPTIONS
            && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
        {
            debug!(origin = %origin, "CORS preflight 종결");
            return Err(MiddlewareError::CorsPreflight {
                origin,
                allow_methods: self.config.allow_methods.join(", "),
                allow_headers: if self.config.allow_headers.is_empty() {
                    None
                } else {
                    Some(self.config.allow_headers.join(", "))
                },
                max_age: self.config.max_age,
                allow_credentials: self.config.allow_credentials,
            });
        }

        Ok(req)
    }

    async fn handle_response(&self, mut res: Response) -> Result<Response, MiddlewareError> {
        let headers = res.headers_mut();

        let origin_value = if self.config.allow_origins.contains(&"*".to_string()) {
            "*".to_string()
        } else if let Some(first) = self.config.allow_origins.first() {
            first.clone()
        } else {
            return Ok(res);
        };

        if let Ok(value) = origin_value.parse() {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }

        if self.config.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                "true".parse().unwrap(),
            );
        }

        if !self.config.expose_headers.is_empty() {
            if let Ok(value) = self.config.expose_headers.join(", ").parse() {
                headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
            }
        }

        Ok(res)
    }
}
