use serde::Deserialize;
use super::server::parse_env_var;
use super::SettingsError;

/// 읽기 전용 관리 엔드포인트 설정입니다.
///
/// 프로세스 시작 시 한 번 초기화되며, 리로드 주기 밖에서 변경되지
/// 않습니다.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    /// 관리 엔드포인트 활성화 여부
    #[serde(default)]
    pub enabled: bool,

    /// 관리 엔드포인트 포트 (기본값: 8081)
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

fn default_admin_port() -> u16 { 8081 }

impl AdminSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            enabled: parse_env_var("GATEWAY_ADMIN_ENABLED", || false)?,
            port: parse_env_var("GATEWAY_ADMIN_PORT", default_admin_port)?,
        })
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_admin_port(),
        }
    }
}
