use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// CORS 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorsConfig {
    /// 허용할 Origin 목록 ("*" 허용)
    #[serde(default)]
    pub allow_origins: Vec<String>,

    /// 허용할 HTTP 메서드 목록
    #[serde(default = "default_methods")]
    pub allow_methods: Vec<String>,

    /// 허용할 헤더 목록
    #[serde(default)]
    pub allow_headers: Vec<String>,

    /// 노출할 헤더 목록
    #[serde(default)]
    pub expose_headers: Vec<String>,

    /// preflight 요청 캐시 시간 (초)
    #[serde(default)]
    pub max_age: Option<u32>,

    /// credentials 허용 여부
    #[serde(default)]
    pub allow_credentials: bool,
}

fn default_methods() -> Vec<String> {
    vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            allow_methods: default_methods(),
            allow_headers: Vec::new(),
            expose_headers: Vec::new(),
            max_age: None,
            allow_credentials: false,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl CorsConfig {
    /// 평탄한 설정 맵에서 설정을 생성합니다.
    pub fn from_flat_map(settings: &HashMap<String, String>) -> Result<Self, String> {
        let mut config = Self::default();

        for (key, value) in settings {
            match key.as_str() {
                "cors.allowOrigins" => config.allow_origins = split_list(value),
                "cors.allowMethods" => config.allow_methods = split_list(value),
                "cors.allowHeaders" => config.allow_headers = split_list(value),
                "cors.exposeHeaders" => config.expose_headers = split_list(value),
                "cors.maxAge" => {
                    config.max_age = Some(value.parse()
                        .map_err(|_| format!("cors.maxAge 값 오류: {}", value))?);
                }
                "cors.allowCredentials" => {
                    config.allow_credentials = value.parse()
                        .map_err(|_| format!("cors.allowCredentials 값 오류: {}", value))?;
                }
                _ => continue,
            }
        }

        if config.allow_origins.is_empty() {
            return Err("cors.allowOrigins가 비어있음".to_string());
        }

        Ok(config)
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allow_origins.iter().any(|allowed| allowed == "*" || allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_map() {
        let mut settings = HashMap::new();
        settings.insert("cors.allowOrigins".to_string(), "https://app.example.com, https://admin.example.com".to_string());
        settings.insert("cors.maxAge".to_string(), "600".to_string());

        let config = CorsConfig::from_flat_map(&settings).unwrap();
        assert_eq!(config.allow_origins.len(), 2);
        assert_eq!(config.max_age, Some(600));
        assert!(config.origin_allowed("https://app.example.com"));
        assert!(!config.origin_allowed("https://evil.example.com"));
    }

    #[test]
    fn test_wildcard_origin() {
        let mut settings = HashMap::new();
        settings.insert("cors.allowOrigins".to_string(), "*".to_string());

        let config = CorsConfig::from_flat_map(&settings).unwrap();
        assert!(config.origin_allowed("https://anything.example.com"));
    }

    #[test]
    fn test_missing_origins_rejected() {
        assert!(CorsConfig::from_flat_map(&HashMap::new()).is_err());
    }
}
