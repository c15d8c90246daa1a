use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use jsonschema::{Draft, JSONSchema};
use tracing::debug;

use crate::middleware::MiddlewareConfig;
use crate::registry::LoadBalancerStrategy;
use super::error::SettingsError;
use super::schema::CONFIG_SCHEMA;
use super::Result;

/// 동적 JSON 설정 파일을 위한 구조체
///
/// 라우터/서비스/미들웨어 선언을 담습니다. 이 리포지토리의 컨테이너
/// 라벨과 같은 모양이며, 로드 시점에 스키마와 타입 검증을 모두
/// 통과해야 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonConfig {
    /// 설정 파일 버전
    #[serde(default = "default_version")]
    pub version: String,

    /// 설정 고유 ID (선택적, 없으면 파일 이름 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// 미들웨어 설정
    #[serde(default)]
    pub middlewares: HashMap<String, MiddlewareConfig>,

    /// 라우터 설정
    #[serde(default)]
    pub routers: HashMap<String, RouterConfig>,

    /// 서비스 설정
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// 라우터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// 라우팅 규칙
    pub rule: String,

    /// 연결된 미들웨어 목록 (선언 순서대로 적용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middlewares: Option<Vec<String>>,

    /// 대상 서비스 이름
    pub service: String,

    /// 우선순위 재정의 (없으면 규칙 구체성 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// 서비스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub loadbalancer: LoadBalancerConfig,
}

/// 로드밸런서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerConfig {
    #[serde(default)]
    pub strategy: LoadBalancerStrategy,

    pub servers: Vec<ServerConfig>,
}

/// 백엔드 서버 하나의 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 백엔드 주소 (예: "http://10.0.0.5:8080")
    pub url: String,

    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl JsonConfig {
    /// 파일에서 설정을 로드하고 스키마 검증까지 수행합니다.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!(path = %path_ref.display(), "JSON 설정 파일 로드");

        let content = tokio::fs::read_to_string(path_ref).await.map_err(|e| {
            SettingsError::FileError {
                path: path_ref.to_string_lossy().to_string(),
                error: e,
            }
        })?;

        Self::from_str(&content, &path_ref.to_string_lossy())
    }

    /// 문자열에서 설정을 파싱합니다.
    pub fn from_str(content: &str, source_name: &str) -> Result<Self> {
        let instance: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| SettingsError::JsonParseError { source: e })?;

        validate_schema(&instance, source_name)?;

        serde_json::from_value(instance)
            .map_err(|e| SettingsError::JsonParseError { source: e })
    }

    /// 설정 ID를 반환합니다. 명시적 id가 없으면 파일 이름을 사용합니다.
    pub fn get_id(&self, path: &Path) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }

        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("config")
            .to_string()
    }
}

/// 내장 JSON 스키마로 설정을 검증합니다.
///
/// 모든 위반 사항을 모아 한 번에 보고합니다.
fn validate_schema(instance: &serde_json::Value, source_name: &str) -> Result<()> {
    let schema_value: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA)
        .expect("내장 스키마는 항상 유효한 JSON");

    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_value)
        .expect("내장 스키마는 항상 컴파일 가능");

    let errors: Vec<String> = match compiled.validate(instance) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect(),
    };

    Err(SettingsError::SchemaError {
        path: source_name.to_string(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_parses() {
        let json = r#"{
            "version": "1.0",
            "routers": {
                "api": {
                    "rule": "Host(`api.example.com`)",
                    "service": "api-backend",
                    "middlewares": ["auth"]
                }
            },
            "services": {
                "api-backend": {
                    "loadbalancer": {
                        "servers": [
                            {"url": "http://10.0.0.5:8080", "weight": 2}
                        ]
                    }
                }
            },
            "middlewares": {
                "auth": {
                    "type": "basic-auth",
                    "settings": {
                        "basicAuth.users": "admin:$2y$05$hash"
                    }
                }
            }
        }"#;

        let config = JsonConfig::from_str(json, "test.json").unwrap();
        assert_eq!(config.routers.len(), 1);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.middlewares.len(), 1);
        assert_eq!(config.services["api-backend"].loadbalancer.servers[0].weight, 2);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let json = r#"{"version": "9.9"}"#;
        let result = JsonConfig::from_str(json, "test.json");
        assert!(matches!(result, Err(SettingsError::SchemaError { .. })));
    }

    #[test]
    fn test_router_without_service_rejected() {
        let json = r#"{
            "version": "1.0",
            "routers": {
                "api": {"rule": "Host(`a.com`)"}
            }
        }"#;
        let result = JsonConfig::from_str(json, "test.json");
        assert!(matches!(result, Err(SettingsError::SchemaError { .. })));
    }

    #[test]
    fn test_empty_servers_rejected() {
        let json = r#"{
            "version": "1.0",
            "services": {
                "api": {"loadbalancer": {"servers": []}}
            }
        }"#;
        let result = JsonConfig::from_str(json, "test.json");
        assert!(matches!(result, Err(SettingsError::SchemaError { .. })));
    }
}
