use std::time::Duration;
use serde::Deserialize;

use crate::proxy::ProxyConfig;
use super::server::parse_env_var;
use super::SettingsError;

/// 전달 단계의 타임아웃/재시도 설정입니다.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwarderSettings {
    /// 백엔드 연결 타임아웃 (초)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// 백엔드 응답 타임아웃 (초)
    #[serde(default = "default_response_timeout")]
    pub response_timeout: u64,

    /// 연결 실패 시 다른 인스턴스로 재시도하는 최대 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 이 횟수만큼 연속 실패한 인스턴스는 비정상으로 전환됨
    #[serde(default = "default_max_instance_failures")]
    pub max_instance_failures: u32,
}

fn default_connect_timeout() -> u64 { 3 }
fn default_response_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }
fn default_max_instance_failures() -> u32 { 3 }

impl ForwarderSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            connect_timeout: parse_env_var("GATEWAY_CONNECT_TIMEOUT", default_connect_timeout)?,
            response_timeout: parse_env_var("GATEWAY_RESPONSE_TIMEOUT", default_response_timeout)?,
            max_retries: parse_env_var("GATEWAY_MAX_RETRIES", default_max_retries)?,
            max_instance_failures: parse_env_var(
                "GATEWAY_MAX_INSTANCE_FAILURES",
                default_max_instance_failures,
            )?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.connect_timeout == 0 || self.response_timeout == 0 {
            return Err(SettingsError::ValidationError {
                field: "proxy".to_string(),
                message: "타임아웃은 0이 될 수 없습니다".to_string(),
            });
        }
        if self.max_instance_failures == 0 {
            return Err(SettingsError::ValidationError {
                field: "proxy.max_instance_failures".to_string(),
                message: "0이 될 수 없습니다".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            response_timeout: Duration::from_secs(self.response_timeout),
            max_retries: self.max_retries,
            max_instance_failures: self.max_instance_failures,
        }
    }
}

impl Default for ForwarderSettings {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            response_timeout: default_response_timeout(),
            max_retries: default_max_retries(),
            max_instance_failures: default_max_instance_failures(),
        }
    }
}
