use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;

use crate::middleware::{ClientInfo, Middleware, MiddlewareError, Request, Response};
use super::config::HeadersConfig;

/// 헤더 수정 미들웨어
///
/// 설정된 요청/응답 헤더 수정을 적용하고, 백엔드가 원 요청의 출처를
/// 알 수 있도록 X-Forwarded-* 헤더를 주입합니다.
pub struct HeadersMiddleware {
    config: HeadersConfig,
}

impl HeadersMiddleware {
    pub fn new(config: HeadersConfig) -> Self {
        Self { config }
    }

    /// 전달 헤더를 주입합니다.
    ///
    /// X-Forwarded-For는 기존 체인 뒤에 클라이언트 주소를 덧붙이고,
    /// X-Forwarded-Proto와 X-Forwarded-Host는 없을 때만 설정합니다.
    fn apply_forwarded_headers(&self, req: &mut Request) {
        let Some(client) = req.extensions().get::<ClientInfo>().copied() else {
            return;
        };

        let host = req.headers()
            .get(hyper::header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let headers = req.headers_mut();

        let client_ip = client.peer_addr.ip().to_string();
        let forwarded_for = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(HeaderName::from_static("x-forwarded-for"), value);
        }

        if !headers.contains_key("x-forwarded-proto") {
            headers.insert(
                HeaderName::from_static("x-forwarded-proto"),
                HeaderValue::from_static(client.scheme),
            );
        }

        if !headers.contains_key("x-forwarded-host") {
            if let Some(host) = host {
                if let Ok(value) = HeaderValue::from_str(&host) {
                    headers.insert(HeaderName::from_static("x-forwarded-host"), value);
                }
            }
        }
    }

    fn apply_security_headers(&self, headers: &mut HeaderMap) {
        headers.insert(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        );
        headers.insert(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=31536000"),
        );
    }
}

#[async_trait]
impl Middleware for HeadersMiddleware {
    fn name(&self) -> &str {
        "headers"
    }

    async fn handle_request(&self, mut req: Request) -> Result<Request, MiddlewareError> {
        if self.config.forwarded {
            self.apply_forwarded_headers(&mut req);
        }
        self.config.request.apply_to_headers(req.headers_mut());
        Ok(req)
    }

    async fn handle_response(&self, mut res: Response) -> Result<Response, MiddlewareError> {
        if self.config.security_headers {
            self.apply_security_headers(res.headers_mut());
        }
        self.config.response.apply_to_headers(res.headers_mut());
        Ok(res)
    }
}
