use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use hyper::http::uri::Uri;
use tracing::debug;

use crate::middleware::{Middleware, MiddlewareError, Request, Response};
use super::config::StripPrefixConfig;

/// 경로 접두사 제거 미들웨어
///
/// 제거된 접두사는 X-Forwarded-Prefix 헤더로 백엔드에 전달됩니다.
pub struct StripPrefixMiddleware {
    config: StripPrefixConfig,
}

impl StripPrefixMiddleware {
    pub fn new(config: StripPrefixConfig) -> Self {
        Self { config }
    }

    fn matching_prefix(&self, path: &str) -> Option<&str> {
        self.config.prefixes.iter()
            .map(String::as_str)
            .find(|prefix| {
                let trimmed = prefix.trim_end_matches('/');
                path == trimmed || path.starts_with(&format!("{}/", trimmed))
            })
    }

    fn rewrite_uri(uri: &Uri, prefix: &str) -> Result<Uri, MiddlewareError> {
        let path = uri.path();
        let stripped = path.strip_prefix(prefix.trim_end_matches('/')).unwrap_or(path);
        let new_path = if stripped.is_empty() { "/" } else { stripped };

        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", new_path, query),
            None => new_path.to_string(),
        };

        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(path_and_query.parse().map_err(|e| {
            MiddlewareError::Execution {
                middleware: "strip-prefix".to_string(),
                message: format!("경로 재작성 실패: {}", e),
            }
        })?);

        Uri::from_parts(parts).map_err(|e| MiddlewareError::Execution {
            middleware: "strip-prefix".to_string(),
            message: format!("URI 재구성 실패: {}", e),
        })
    }
}

#[async_trait]
impl Middleware for StripPrefixMiddleware {
    fn name(&self) -> &str {
        "strip-prefix"
    }

    async fn handle_request(&self, mut req: Request) -> Result<Request, MiddlewareError> {
        let path = req.uri().path().to_string();

        if let Some(prefix) = self.matching_prefix(&path) {
            let prefix = prefix.to_string();
            let new_uri = Self::rewrite_uri(req.uri(), &prefix)?;
            debug!(from = %path, to = %new_uri.path(), "경로 접두사 제거");

            *req.uri_mut() = new_uri;
            if let Ok(value) = HeaderValue::from_str(&prefix) {
                req.headers_mut().insert(
                    HeaderName::from_static("x-forwarded-prefix"),
                    value,
                );
            }
        }

        Ok(req)
    }

    async fn handle_response(&self, res: Response) -> Result<Response, MiddlewareError> {
        Ok(res)
    }
}
