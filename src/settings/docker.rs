use serde::Deserialize;
use super::{parse_env_var, SettingsError};

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheckSettings {
    /// 능동 헬스 체크 활성화 여부
    #[serde(default)]
    pub enabled: bool,

    /// 체크 간격 (초)
    #[serde(default = "default_check_interval")]
    pub interval: u64,

    /// 체크 타임아웃 (초)
    #[serde(default = "default_check_timeout")]
    pub timeout: u64,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_check_interval(),
            timeout: default_check_timeout(),
        }
    }
}

fn default_check_interval() -> u64 {
    30
}

fn default_check_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerSettings {
    /// Docker 디스커버리 활성화 여부
    #[serde(default)]
    pub enabled: bool,

    /// 컨테이너 주소를 읽을 Docker 네트워크 이름
    #[serde(default = "default_docker_network")]
    pub network: String,

    /// 라벨 접두사
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,

    /// 헬스 체크 설정
    #[serde(default)]
    pub health_check: HealthCheckSettings,
}

impl DockerSettings {
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            enabled: parse_env_var("GATEWAY_DOCKER_ENABLED", || false)?,
            network: parse_env_var("GATEWAY_DOCKER_NETWORK", default_docker_network)?,
            label_prefix: parse_env_var("GATEWAY_LABEL_PREFIX", default_label_prefix)?,
            health_check: HealthCheckSettings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.is_empty() {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_DOCKER_NETWORK".to_string(),
                value: self.network.clone(),
                reason: "네트워크 이름은 비어있을 수 없습니다".to_string(),
            });
        }

        if !self.network.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_DOCKER_NETWORK".to_string(),
                value: self.network.clone(),
                reason: "Docker 네트워크 이름은 영숫자와 -_ 만 포함할 수 있습니다".to_string(),
            });
        }

        if !self.label_prefix.ends_with('.') {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "GATEWAY_LABEL_PREFIX".to_string(),
                value: self.label_prefix.clone(),
                reason: "라벨 접두사는 '.'으로 끝나야 합니다".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            network: default_docker_network(),
            label_prefix: default_label_prefix(),
            health_check: HealthCheckSettings::default(),
        }
    }
}

fn default_docker_network() -> String {
    "edge".to_string()
}

fn default_label_prefix() -> String {
    "gateway.".to_string()
}
