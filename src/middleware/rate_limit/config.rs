use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rate Limit 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// 초당 보충되는 토큰 수
    #[serde(default = "default_average")]
    pub average: u32,

    /// 버스트 허용량 (버킷 최대 크기)
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_average() -> u32 {
    100
}

fn default_burst() -> u32 {
    50
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            average: default_average(),
            burst: default_burst(),
        }
    }
}

impl RateLimitConfig {
    /// 평탄한 설정 맵에서 설정을 생성합니다.
    pub fn from_flat_map(settings: &HashMap<String, String>) -> Result<Self, String> {
        let mut config = Self::default();

        for (key, value) in settings {
            match key.as_str() {
                "rateLimit.average" => {
                    config.average = value.parse()
                        .map_err(|_| format!("rateLimit.average 값 오류: {}", value))?;
                }
                "rateLimit.burst" => {
                    config.burst = value.parse()
                        .map_err(|_| format!("rateLimit.burst 값 오류: {}", value))?;
                }
                _ => continue,
            }
        }

        if config.average == 0 {
            return Err("rateLimit.average는 0보다 커야 함".to_string());
        }

        Ok(config)
    }
}
