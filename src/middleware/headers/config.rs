use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

/// 헤더 수정 작업 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HeaderModification {
    /// 기존 값에 추가할 헤더
    #[serde(default)]
    pub add: HashMap<String, String>,

    /// 삭제할 헤더
    #[serde(default)]
    pub remove: Vec<String>,

    /// 덮어쓸 헤더
    #[serde(default)]
    pub set: HashMap<String, String>,
}

impl HeaderModification {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.set.is_empty()
    }

    /// 수정 작업을 헤더 맵에 적용합니다.
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) {
        for name in &self.remove {
            if let Ok(name) = name.parse::<HeaderName>() {
                headers.remove(&name);
            }
        }

        for (name, value) in &self.set {
            match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "유효하지 않은 헤더 이름 또는 값"),
            }
        }

        for (name, value) in &self.add {
            match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "유효하지 않은 헤더 이름 또는 값"),
            }
        }
    }
}

/// 헤더 미들웨어 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HeadersConfig {
    /// 요청 헤더 수정 설정
    #[serde(default)]
    pub request: HeaderModification,

    /// 응답 헤더 수정 설정
    #[serde(default)]
    pub response: HeaderModification,

    /// X-Forwarded-For / X-Forwarded-Proto / X-Forwarded-Host 주입 여부
    #[serde(default = "default_forwarded")]
    pub forwarded: bool,

    /// 기본 보안 헤더(X-Frame-Options 등) 주입 여부
    #[serde(default)]
    pub security_headers: bool,
}

fn default_forwarded() -> bool {
    true
}

impl HeadersConfig {
    /// 평탄한 설정 맵에서 설정을 생성합니다.
    ///
    /// `headers.customRequestHeaders.<이름>`과
    /// `headers.customResponseHeaders.<이름>` 키를 받아들입니다.
    /// 값이 빈 문자열이면 해당 헤더를 제거합니다.
    pub fn from_flat_map(settings: &HashMap<String, String>) -> Result<Self, String> {
        let mut config = Self {
            forwarded: default_forwarded(),
            ..Default::default()
        };

        for (key, value) in settings {
            if let Some(name) = key.strip_prefix("headers.customRequestHeaders.") {
                if value.is_empty() {
                    config.request.remove.push(name.to_string());
                } else {
                    config.request.set.insert(name.to_string(), value.clone());
                }
            } else if let Some(name) = key.strip_prefix("headers.customResponseHeaders.") {
                if value.is_empty() {
                    config.response.remove.push(name.to_string());
                } else {
                    config.response.set.insert(name.to_string(), value.clone());
                }
            } else if key == "headers.forwarded" {
                config.forwarded = value.parse()
                    .map_err(|_| format!("headers.forwarded 값 오류: {}", value))?;
            } else if key == "headers.securityHeaders" {
                config.security_headers = value.parse()
                    .map_err(|_| format!("headers.securityHeaders 값 오류: {}", value))?;
            }
        }

        Ok(config)
    }
}
