use std::collections::HashSet;
use hyper::header;
use tracing::{debug, warn};

use crate::matcher::{RequestInfo, RouterRule};
use crate::router::error::{
    RouteValidationError, RouterError, ValidationErrorKind, ValidationErrors,
};
use crate::router::host::HostInfo;
use crate::router::route::{Route, RouteDefinition};

/// 불변 라우팅 테이블 스냅샷입니다.
///
/// `build`는 전체 정의를 검증해 실패를 전부 모아 보고하거나, 완전히
/// 빌드된 스냅샷을 반환합니다. 매칭 순서는 구체성 내림차순, 동점은
/// 선언 순서로 고정되어 동일 입력에 대해 항상 같은 결과를 냅니다.
#[derive(Debug, Clone)]
pub struct RouterTable {
    version: u64,
    routes: Vec<Route>,
}

impl RouterTable {
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            routes: Vec::new(),
        }
    }

    /// 라우트 정의를 검증하고 스냅샷을 빌드합니다.
    ///
    /// 실패한 라우트가 하나라도 있으면 스냅샷은 만들어지지 않고 모든
    /// 검증 에러가 반환됩니다.
    pub fn build(
        version: u64,
        definitions: &[RouteDefinition],
        known_services: &HashSet<String>,
        known_middlewares: &HashSet<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut routes = Vec::new();

        for (index, definition) in definitions.iter().enumerate() {
            if !seen_ids.insert(definition.id.clone()) {
                errors.push(RouteValidationError {
                    route_id: definition.id.clone(),
                    kind: ValidationErrorKind::DuplicateId,
                });
                continue;
            }

            if !known_services.contains(&definition.service) {
                errors.push(RouteValidationError {
                    route_id: definition.id.clone(),
                    kind: ValidationErrorKind::UnknownService {
                        service: definition.service.clone(),
                    },
                });
                continue;
            }

            let mut middleware_missing = false;
            for middleware in &definition.middlewares {
                if !known_middlewares.contains(middleware) {
                    errors.push(RouteValidationError {
                        route_id: definition.id.clone(),
                        kind: ValidationErrorKind::UnknownMiddleware {
                            middleware: middleware.clone(),
                        },
                    });
                    middleware_missing = true;
                }
            }
            if middleware_missing {
                continue;
            }

            let rule = match RouterRule::parse(&definition.rule) {
                Ok(rule) => rule,
                Err(source) => {
                    errors.push(RouteValidationError {
                        route_id: definition.id.clone(),
                        kind: ValidationErrorKind::InvalidRule { source },
                    });
                    continue;
                }
            };

            let priority = definition.priority.unwrap_or_else(|| rule.specificity());
            routes.push(Route {
                id: definition.id.clone(),
                rule,
                service: definition.service.clone(),
                middlewares: definition.middlewares.clone(),
                priority,
                index,
            });
        }

        if !errors.is_empty() {
            warn!(error_count = errors.len(), "라우팅 테이블 빌드 거부");
            return Err(ValidationErrors { errors });
        }

        // 구체성 내림차순, 동점은 선언 순서
        routes.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.index.cmp(&b.index)));

        Ok(Self { version, routes })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// HTTP 요청에 매칭되는 라우트를 찾습니다.
    pub fn match_request<B>(&self, req: &hyper::Request<B>) -> Result<&Route, RouterError> {
        let host_info = Self::extract_host(req)?;
        let path = req.uri().path();
        let method = req.method().as_str();

        let info = RequestInfo {
            host: &host_info.name,
            path,
            method,
            headers: req.headers(),
        };

        match self.matches(&info) {
            Some(route) => {
                debug!(route = %route.id, host = %host_info.name, path = %path, "라우트 매칭");
                Ok(route)
            }
            None => Err(RouterError::RouteNotFound {
                host: host_info.name,
                path: path.to_string(),
            }),
        }
    }

    /// 요청 속성에 매칭되는 가장 구체적인 라우트를 반환합니다.
    pub fn matches(&self, info: &RequestInfo<'_>) -> Option<&Route> {
        self.routes.iter().find(|route| route.rule.evaluate(info))
    }

    /// HTTP 요청에서 호스트 정보를 추출합니다.
    pub fn extract_host<B>(req: &hyper::Request<B>) -> Result<HostInfo, RouterError> {
        let host = match req.headers().get(header::HOST) {
            Some(value) => value,
            None => return Err(RouterError::MissingHost),
        };

        let host_str = host.to_str().map_err(|e| RouterError::HeaderParseError {
            header_name: "Host".to_string(),
            error: e.to_string(),
        })?;

        HostInfo::from_header_value(host_str)
    }
}
