use serde::Deserialize;
use std::env;
use super::SettingsError;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// HTTP 포트 (기본값: 80)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// HTTPS 활성화 여부
    #[serde(default)]
    pub https_enabled: bool,

    /// HTTPS 포트 (기본값: 443)
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

fn default_http_port() -> u16 { 80 }
fn default_https_port() -> u16 { 443 }

/// 환경 변수를 파싱하고 없으면 기본값을 사용합니다.
pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            http_port: parse_env_var("GATEWAY_HTTP_PORT", default_http_port)?,
            https_port: parse_env_var("GATEWAY_HTTPS_PORT", default_https_port)?,
            https_enabled: parse_env_var("GATEWAY_HTTPS_ENABLED", || false)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.http_port == 0 {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_HTTP_PORT".to_string(),
                value: "0".to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }

        if self.https_enabled && self.http_port == self.https_port {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_HTTP_PORT/GATEWAY_HTTPS_PORT".to_string(),
                value: format!("{}/{}", self.http_port, self.https_port),
                reason: "HTTP와 HTTPS 포트는 달라야 합니다".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            https_enabled: false,
            https_port: default_https_port(),
        }
    }
}
