use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 지원하는 미들웨어 타입입니다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MiddlewareType {
    BasicAuth,
    Headers,
    RateLimit,
    StripPrefix,
    Cors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// 미들웨어 타입
    #[serde(rename = "type")]
    pub middleware_type: MiddlewareType,

    /// 미들웨어 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 체인 내 실행 순서 재정의 (낮은 숫자가 먼저, 기본은 선언 순서)
    #[serde(default)]
    pub order: i32,

    /// 미들웨어별 설정
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl MiddlewareConfig {
    /// 컨테이너 라벨에서 미들웨어 설정을 파싱합니다.
    ///
    /// `<prefix>http.middlewares.<이름>.<키>=<값>` 형식의 라벨을
    /// 미들웨어 이름별로 묶어 설정으로 변환합니다.
    pub fn from_labels(
        labels: &HashMap<String, String>,
        label_prefix: &str,
    ) -> Result<Vec<(String, Self)>, String> {
        let prefix = format!("{}http.middlewares.", label_prefix);
        let mut middleware_groups: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (key, value) in labels {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if let Some((name, setting_key)) = rest.split_once('.') {
                    middleware_groups
                        .entry(name.to_string())
                        .or_default()
                        .insert(setting_key.to_string(), value.clone());
                }
            }
        }

        let mut configs = Vec::new();
        for (name, settings) in middleware_groups {
            let type_str = settings.get("type")
                .ok_or_else(|| format!("미들웨어 {}에 type 라벨이 없음", name))?;

            let middleware_type = match type_str.as_str() {
                "basic-auth" => MiddlewareType::BasicAuth,
                "headers" => MiddlewareType::Headers,
                "rate-limit" => MiddlewareType::RateLimit,
                "strip-prefix" => MiddlewareType::StripPrefix,
                "cors" => MiddlewareType::Cors,
                other => return Err(format!("알 수 없는 미들웨어 타입: {}", other)),
            };

            let config = MiddlewareConfig {
                middleware_type,
                enabled: settings.get("enabled")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(true),
                order: settings.get("order")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
                settings: settings.into_iter()
                    .filter(|(k, _)| k != "type" && k != "enabled" && k != "order")
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect(),
            };
            configs.push((name, config));
        }

        configs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(configs)
    }

    /// 설정 맵을 평탄한 문자열 맵으로 변환합니다.
    ///
    /// 라벨 기반 설정과 JSON 기반 설정을 같은 파서로 처리하기 위한
    /// 공통 형식입니다.
    pub fn flat_settings(&self) -> HashMap<String, String> {
        self.settings.iter()
            .map(|(k, v)| {
                let value = v.as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| v.to_string());
                (k.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_labels() {
        let mut labels = HashMap::new();
        labels.insert(
            "gateway.http.middlewares.api-auth.type".to_string(),
            "basic-auth".to_string(),
        );
        labels.insert(
            "gateway.http.middlewares.api-auth.basicAuth.users".to_string(),
            "admin:$2y$05$abcdefghijklmnopqrstuv".to_string(),
        );
        labels.insert(
            "gateway.http.middlewares.api-limit.type".to_string(),
            "rate-limit".to_string(),
        );
        labels.insert(
            "gateway.http.middlewares.api-limit.rateLimit.average".to_string(),
            "10".to_string(),
        );

        let configs = MiddlewareConfig::from_labels(&labels, "gateway.").unwrap();
        assert_eq!(configs.len(), 2);

        let (name, config) = &configs[0];
        assert_eq!(name, "api-auth");
        assert_eq!(config.middleware_type, MiddlewareType::BasicAuth);
        assert!(config.enabled);
        assert!(config.settings.contains_key("basicAuth.users"));

        let (name, config) = &configs[1];
        assert_eq!(name, "api-limit");
        assert_eq!(config.middleware_type, MiddlewareType::RateLimit);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut labels = HashMap::new();
        labels.insert(
            "gateway.http.middlewares.m.type".to_string(),
            "compress".to_string(),
        );

        assert!(MiddlewareConfig::from_labels(&labels, "gateway.").is_err());
    }

    #[test]
    fn test_disabled_flag_parsed() {
        let mut labels = HashMap::new();
        labels.insert(
            "gateway.http.middlewares.m.type".to_string(),
            "headers".to_string(),
        );
        labels.insert(
            "gateway.http.middlewares.m.enabled".to_string(),
            "false".to_string(),
        );

        let configs = MiddlewareConfig::from_labels(&labels, "gateway.").unwrap();
        assert!(!configs[0].1.enabled);
    }
}
