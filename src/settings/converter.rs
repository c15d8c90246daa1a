use std::collections::HashMap;
use std::net::SocketAddr;
use url::Url;

use crate::middleware::MiddlewareConfig;
use crate::registry::{InstanceDefinition, ServiceDefinition};
use crate::router::RouteDefinition;
use super::error::SettingsError;
use super::json::JsonConfig;
use super::types::{ValidMiddlewareId, ValidRouterId, ValidServiceId};
use super::Result;

/// 엔진에 공급되는 동적 구성입니다.
///
/// JSON 파일과 디스커버리 이벤트가 모두 이 형태로 수렴한 뒤
/// 라우팅 테이블 빌드에 들어갑니다.
#[derive(Debug, Clone, Default)]
pub struct DynamicConfig {
    pub routes: Vec<RouteDefinition>,
    pub services: Vec<ServiceDefinition>,
    pub middlewares: HashMap<String, MiddlewareConfig>,
}

impl DynamicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 설정 파일 하나를 병합합니다.
    ///
    /// 식별자 형식과 백엔드 주소를 이 시점에 검증합니다. 라우트 id
    /// 중복은 스냅샷 빌드에서 한꺼번에 보고되므로 여기서는 미들웨어
    /// 이름 중복만 거부합니다.
    pub fn merge_json(&mut self, config: JsonConfig) -> Result<()> {
        for (name, middleware_config) in &config.middlewares {
            ValidMiddlewareId::new(name.as_str()).ok_or_else(|| SettingsError::ValidationError {
                field: format!("middlewares.{}", name),
                message: "유효하지 않은 미들웨어 이름".to_string(),
            })?;

            if self.middlewares.contains_key(name) {
                return Err(SettingsError::DuplicateMiddleware(name.clone()));
            }
            self.middlewares.insert(name.clone(), middleware_config.clone());
        }

        // JSON 객체는 순서를 보존하지 않으므로 이름순이 선언 순서가 됨
        let mut router_names: Vec<&String> = config.routers.keys().collect();
        router_names.sort();

        for name in router_names {
            ValidRouterId::new(name.as_str()).ok_or_else(|| SettingsError::ValidationError {
                field: format!("routers.{}", name),
                message: "유효하지 않은 라우터 이름".to_string(),
            })?;

            let router = &config.routers[name];
            self.routes.push(RouteDefinition {
                id: name.clone(),
                rule: router.rule.clone(),
                service: router.service.clone(),
                middlewares: router.middlewares.clone().unwrap_or_default(),
                priority: router.priority,
            });
        }

        let mut service_names: Vec<&String> = config.services.keys().collect();
        service_names.sort();

        for name in service_names {
            ValidServiceId::new(name.as_str()).ok_or_else(|| SettingsError::ValidationError {
                field: format!("services.{}", name),
                message: "유효하지 않은 서비스 이름".to_string(),
            })?;

            let service = &config.services[name];
            let mut instances = Vec::new();
            for server in &service.loadbalancer.servers {
                instances.push(InstanceDefinition {
                    address: parse_server_url(name, &server.url)?,
                    weight: server.weight,
                });
            }

            self.services.push(ServiceDefinition {
                name: name.clone(),
                strategy: service.loadbalancer.strategy,
                instances,
            });
        }

        Ok(())
    }

    /// 디스커버리 이벤트로 발견된 정의를 병합합니다.
    pub fn merge_discovered(
        &mut self,
        routes: Vec<RouteDefinition>,
        services: Vec<ServiceDefinition>,
        middlewares: Vec<(String, MiddlewareConfig)>,
    ) {
        self.routes.extend(routes);
        self.services.extend(services);
        for (name, config) in middlewares {
            // 파일 설정이 라벨 설정보다 우선
            self.middlewares.entry(name).or_insert(config);
        }
    }

    /// 라우터별 미들웨어 매핑을 반환합니다.
    pub fn router_middlewares(&self) -> HashMap<String, Vec<String>> {
        self.routes.iter()
            .filter(|route| !route.middlewares.is_empty())
            .map(|route| (route.id.clone(), route.middlewares.clone()))
            .collect()
    }
}

/// `http://10.0.0.5:8080` 형태의 백엔드 URL을 소켓 주소로 변환합니다.
fn parse_server_url(service: &str, raw: &str) -> Result<SocketAddr> {
    let url = Url::parse(raw).map_err(|e| SettingsError::ValidationError {
        field: format!("services.{}.loadbalancer.servers", service),
        message: format!("유효하지 않은 URL {}: {}", raw, e),
    })?;

    let host = url.host_str().ok_or_else(|| SettingsError::ValidationError {
        field: format!("services.{}.loadbalancer.servers", service),
        message: format!("URL {}에 호스트가 없음", raw),
    })?;

    let port = url.port_or_known_default().ok_or_else(|| SettingsError::ValidationError {
        field: format!("services.{}.loadbalancer.servers", service),
        message: format!("URL {}에 포트가 없음", raw),
    })?;

    format!("{}:{}", host, port).parse().map_err(|_| SettingsError::ValidationError {
        field: format!("services.{}.loadbalancer.servers", service),
        message: format!("백엔드 주소는 IP:포트 형식이어야 함: {}:{}", host, port),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LoadBalancerStrategy;

    #[test]
    fn test_merge_json_produces_definitions() {
        let json = r#"{
            "version": "1.0",
            "routers": {
                "web": {
                    "rule": "Host(`app.example.com`)",
                    "service": "web-backend"
                }
            },
            "services": {
                "web-backend": {
                    "loadbalancer": {
                        "strategy": "weighted",
                        "servers": [
                            {"url": "http://10.0.0.5:8080", "weight": 3},
                            {"url": "http://10.0.0.6:8080"}
                        ]
                    }
                }
            }
        }"#;
        let config = JsonConfig::from_str(json, "test.json").unwrap();

        let mut dynamic = DynamicConfig::new();
        dynamic.merge_json(config).unwrap();

        assert_eq!(dynamic.routes.len(), 1);
        assert_eq!(dynamic.routes[0].id, "web");
        assert_eq!(dynamic.services.len(), 1);
        assert_eq!(dynamic.services[0].strategy, LoadBalancerStrategy::Weighted);
        assert_eq!(dynamic.services[0].instances.len(), 2);
        assert_eq!(dynamic.services[0].instances[0].weight, 3);
        assert_eq!(dynamic.services[0].instances[1].weight, 1);
    }

    #[test]
    fn test_duplicate_middleware_rejected() {
        let json = r#"{
            "version": "1.0",
            "middlewares": {
                "auth": {"type": "headers", "settings": {}}
            }
        }"#;
        let config = JsonConfig::from_str(json, "a.json").unwrap();

        let mut dynamic = DynamicConfig::new();
        dynamic.merge_json(config.clone()).unwrap();
        let result = dynamic.merge_json(config);

        assert!(matches!(result, Err(SettingsError::DuplicateMiddleware(_))));
    }

    #[test]
    fn test_hostname_backend_rejected() {
        let json = r#"{
            "version": "1.0",
            "services": {
                "api": {
                    "loadbalancer": {
                        "servers": [{"url": "http://backend.internal:8080"}]
                    }
                }
            }
        }"#;
        let config = JsonConfig::from_str(json, "test.json").unwrap();

        let mut dynamic = DynamicConfig::new();
        assert!(dynamic.merge_json(config).is_err());
    }
}
