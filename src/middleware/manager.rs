use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::middleware::basic_auth::{BasicAuthConfig, BasicAuthMiddleware};
use crate::middleware::cors::{CorsConfig, CorsMiddleware};
use crate::middleware::headers::{HeadersConfig, HeadersMiddleware};
use crate::middleware::rate_limit::{RateLimitConfig, RateLimitMiddleware};
use crate::middleware::strip_prefix::{StripPrefixConfig, StripPrefixMiddleware};
use super::config::MiddlewareType;
use super::{Middleware, MiddlewareChain, MiddlewareConfig, MiddlewareError, Request, Response};

/// 미들웨어 설정으로부터 미들웨어 인스턴스를 생성합니다.
fn create_middleware(config: &MiddlewareConfig) -> Result<Arc<dyn Middleware>, MiddlewareError> {
    debug!(middleware_type = ?config.middleware_type, "미들웨어 생성");
    let flat = config.flat_settings();

    match config.middleware_type {
        MiddlewareType::BasicAuth => {
            let auth_config = BasicAuthConfig::from_flat_map(&flat)
                .map_err(MiddlewareError::Config)?;
            Ok(Arc::new(BasicAuthMiddleware::new(auth_config)?))
        }
        MiddlewareType::Headers => {
            let headers_config = HeadersConfig::from_flat_map(&flat)
                .map_err(MiddlewareError::Config)?;
            Ok(Arc::new(HeadersMiddleware::new(headers_config)))
        }
        MiddlewareType::RateLimit => {
            let rate_config = RateLimitConfig::from_flat_map(&flat)
                .map_err(MiddlewareError::Config)?;
            Ok(Arc::new(RateLimitMiddleware::new(rate_config)))
        }
        MiddlewareType::StripPrefix => {
            let strip_config = StripPrefixConfig::from_flat_map(&flat)
                .map_err(MiddlewareError::Config)?;
            Ok(Arc::new(StripPrefixMiddleware::new(strip_config)))
        }
        MiddlewareType::Cors => {
            let cors_config = CorsConfig::from_flat_map(&flat)
                .map_err(MiddlewareError::Config)?;
            Ok(Arc::new(CorsMiddleware::new(cors_config)))
        }
    }
}

/// 라우터별 미들웨어 체인을 관리합니다.
///
/// 미들웨어 인스턴스는 이름으로 한 번만 생성되어 여러 라우터 체인이
/// 공유합니다 (요청 한도 버킷 같은 상태가 이름 단위로 유지되도록).
#[derive(Default, Clone)]
pub struct MiddlewareManager {
    middlewares: HashMap<String, Arc<dyn Middleware>>,
    router_chains: HashMap<String, MiddlewareChain>,
}

impl MiddlewareManager {
    /// 미들웨어 설정과 라우터-미들웨어 매핑으로 매니저를 생성합니다.
    ///
    /// 생성에 실패한 미들웨어 설정이 있으면 전체가 거부됩니다.
    pub fn new(
        middleware_configs: &HashMap<String, MiddlewareConfig>,
        router_middlewares: &HashMap<String, Vec<String>>,
    ) -> Result<Self, MiddlewareError> {
        let mut middlewares: HashMap<String, Arc<dyn Middleware>> = HashMap::new();

        for (name, config) in middleware_configs {
            if !config.enabled {
                debug!(name = %name, "비활성화된 미들웨어 건너뜀");
                continue;
            }
            let middleware = create_middleware(config).map_err(|e| {
                error!(error = %e, name = %name, "미들웨어 생성 실패");
                e
            })?;
            middlewares.insert(name.clone(), middleware);
        }

        let mut router_chains = HashMap::new();
        for (router_name, names) in router_middlewares {
            let mut chain = MiddlewareChain::new();

            // 선언 순서가 기본, order 필드로 재정의 가능
            let mut ordered: Vec<(usize, &String)> = names.iter().enumerate().collect();
            ordered.sort_by_key(|(position, name)| {
                let order = middleware_configs.get(*name).map(|c| c.order).unwrap_or(0);
                (order, *position)
            });

            for (_, name) in ordered {
                match middlewares.get(name) {
                    Some(middleware) => chain.add(middleware.clone()),
                    None => {
                        return Err(MiddlewareError::Config(format!(
                            "라우터 {}가 존재하지 않는 미들웨어 {}를 참조함",
                            router_name, name
                        )));
                    }
                }
            }

            router_chains.insert(router_name.clone(), chain);
        }

        Ok(Self {
            middlewares,
            router_chains,
        })
    }

    /// 구성된 미들웨어 이름 집합을 반환합니다 (스냅샷 검증용).
    pub fn middleware_names(&self) -> std::collections::HashSet<String> {
        self.middlewares.keys().cloned().collect()
    }

    pub async fn handle_request(
        &self,
        router_name: Option<&str>,
        req: Request,
    ) -> Result<Request, MiddlewareError> {
        match router_name.and_then(|name| self.router_chains.get(name)) {
            Some(chain) => chain.handle_request(req).await,
            None => Ok(req),
        }
    }

    pub async fn handle_response(
        &self,
        router_name: Option<&str>,
        res: Response,
    ) -> Result<Response, MiddlewareError> {
        match router_name.and_then(|name| self.router_chains.get(name)) {
            Some(chain) => chain.handle_response(res).await,
            None => Ok(res),
        }
    }
}
