use async_trait::async_trait;
use tracing::debug;

use crate::middleware::{ClientInfo, Middleware, MiddlewareError, Request, Response};
use super::config::RateLimitConfig;
use super::store::TokenBucketStore;

/// Rate Limit 미들웨어
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    store: TokenBucketStore,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            store: TokenBucketStore::new(),
        }
    }

    /// 클라이언트 식별자를 추출합니다.
    ///
    /// 프록시 체인을 거쳐 온 경우 X-Forwarded-For의 첫 주소를,
    /// 아니면 연결의 피어 주소를 사용합니다.
    fn client_key(req: &Request) -> String {
        if let Some(forwarded) = req.headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
        {
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().to_string();
            }
        }

        if let Some(real_ip) = req.headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
        {
            return real_ip.to_string();
        }

        req.extensions()
            .get::<ClientInfo>()
            .map(|c| c.peer_addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &str {
        "rate-limit"
    }

    async fn handle_request(&self, req: Request) -> Result<Request, MiddlewareError> {
        let key = Self::client_key(&req);
        debug!(client = %key, "요청 한도 확인");

        let allowed = self.store.check_rate(
            &key,
            self.config.average as f64,
            self.config.burst as f64,
        ).await;

        if allowed {
            Ok(req)
        } else {
            let retry_after = self.store.time_to_next_request(&key).await
                .unwrap_or_default();
            Err(MiddlewareError::TooManyRequests {
                limit: self.config.average,
                retry_after_secs: retry_after.as_secs().max(1),
            })
        }
    }

    async fn handle_response(&self, res: Response) -> Result<Response, MiddlewareError> {
        Ok(res)
    }
}
