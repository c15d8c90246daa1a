use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hyper::header;
use tracing::debug;

use crate::middleware::{Middleware, MiddlewareError, Request, Response};
use super::auth::{create_authenticator, Authenticator};
use super::config::BasicAuthConfig;

/// Basic 인증 미들웨어
pub struct BasicAuthMiddleware {
    config: BasicAuthConfig,
    authenticator: Box<dyn Authenticator>,
}

impl BasicAuthMiddleware {
    pub fn new(config: BasicAuthConfig) -> Result<Self, MiddlewareError> {
        let authenticator = create_authenticator(&config)?;
        Ok(Self {
            config,
            authenticator,
        })
    }

    /// Authorization 헤더에서 자격증명을 추출합니다.
    fn extract_credentials(&self, req: &Request) -> Option<(String, String)> {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|auth| {
                let credentials = auth.strip_prefix("Basic ")?;
                BASE64.decode(credentials.trim()).ok()
            })
            .and_then(|decoded| String::from_utf8(decoded).ok())
            .and_then(|pair| {
                let mut parts = pair.splitn(2, ':');
                Some((
                    parts.next()?.to_string(),
                    parts.next()?.to_string(),
                ))
            })
    }

    fn reject(&self, reason: &str) -> MiddlewareError {
        MiddlewareError::Unauthorized {
            realm: self.config.realm.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Middleware for BasicAuthMiddleware {
    fn name(&self) -> &str {
        "basic-auth"
    }

    async fn handle_request(&self, req: Request) -> Result<Request, MiddlewareError> {
        match self.extract_credentials(&req) {
            Some((username, password)) => {
                if self.authenticator.verify_credentials(&username, &password) {
                    debug!(user = %username, "인증 성공");
                    Ok(req)
                } else {
                    Err(self.reject("잘못된 자격증명"))
                }
            }
            None => Err(self.reject("Authorization 헤더 누락 또는 형식 오류")),
        }
    }

    async fn handle_response(&self, res: Response) -> Result<Response, MiddlewareError> {
        Ok(res)
    }
}
