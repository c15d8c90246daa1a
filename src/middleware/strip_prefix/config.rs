use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 경로 접두사 제거 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StripPrefixConfig {
    /// 제거할 접두사 목록 (먼저 매칭되는 접두사가 적용됨)
    #[serde(default)]
    pub prefixes: Vec<String>,
}

impl StripPrefixConfig {
    /// 평탄한 설정 맵에서 설정을 생성합니다.
    ///
    /// `stripPrefix.prefixes`는 콤마로 구분된 접두사 목록입니다.
    pub fn from_flat_map(settings: &HashMap<String, String>) -> Result<Self, String> {
        let prefixes: Vec<String> = settings.get("stripPrefix.prefixes")
            .map(|value| {
                value.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if prefixes.is_empty() {
            return Err("stripPrefix.prefixes가 비어있음".to_string());
        }

        for prefix in &prefixes {
            if !prefix.starts_with('/') {
                return Err(format!("접두사는 '/'로 시작해야 함: {}", prefix));
            }
        }

        Ok(Self { prefixes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_map() {
        let mut settings = HashMap::new();
        settings.insert("stripPrefix.prefixes".to_string(), "/api, /v1".to_string());

        let config = StripPrefixConfig::from_flat_map(&settings).unwrap();
        assert_eq!(config.prefixes, vec!["/api".to_string(), "/v1".to_string()]);
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let mut settings = HashMap::new();
        settings.insert("stripPrefix.prefixes".to_string(), "api".to_string());
        assert!(StripPrefixConfig::from_flat_map(&settings).is_err());

        let settings = HashMap::new();
        assert!(StripPrefixConfig::from_flat_map(&settings).is_err());
    }
}
