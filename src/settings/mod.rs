//! 정적 설정(TOML/환경 변수)과 동적 설정(JSON)을 로드하고 검증하는 모듈입니다.

use std::env;
use std::path::Path;
use serde::Deserialize;
use tracing::{debug, info};

mod admin;
mod converter;
pub mod docker;
mod error;
mod json;
pub mod logging;
mod proxy;
mod schema;
mod server;
mod tls;
pub mod types;
pub mod watcher;

pub use admin::AdminSettings;
pub use converter::DynamicConfig;
pub use docker::{DockerSettings, HealthCheckSettings};
pub use error::SettingsError;
pub use json::JsonConfig;
pub use logging::LogSettings;
pub use proxy::ForwarderSettings;
pub use server::{parse_env_var, ServerSettings};
pub use tls::{CertificateSettings, DefaultCertificateSettings, TlsSettings};
pub use types::{ValidMiddlewareId, ValidRouterId, ValidServiceId, Version};

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 리스너 설정
    #[serde(default)]
    pub server: ServerSettings,

    /// 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// TLS 인증서 설정
    #[serde(default)]
    pub tls: TlsSettings,

    /// 관리 엔드포인트 설정
    #[serde(default)]
    pub admin: AdminSettings,

    /// 전달 단계 설정
    #[serde(default)]
    pub proxy: ForwarderSettings,

    /// Docker 디스커버리 설정
    #[serde(default)]
    pub docker: DockerSettings,

    /// 동적 JSON 설정 디렉토리
    #[serde(default)]
    pub config_dir: Option<String>,
}

impl Settings {
    /// 설정을 로드합니다.
    ///
    /// `GATEWAY_CONFIG_FILE`이 지정되어 있으면 TOML 파일에서, 아니면
    /// 환경 변수에서 로드합니다.
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("GATEWAY_CONFIG_FILE") {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env().await
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            SettingsError::FileError {
                path: path.as_ref().to_string_lossy().to_string(),
                error: e,
            }
        })?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate().await?;
        Ok(settings)
    }

    pub async fn from_env() -> Result<Self> {
        let settings = Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            tls: TlsSettings::from_env()?,
            admin: AdminSettings::from_env()?,
            proxy: ForwarderSettings::from_env()?,
            docker: DockerSettings::from_env()?,
            config_dir: env::var("GATEWAY_CONFIG_DIR").ok(),
        };

        settings.validate().await?;
        Ok(settings)
    }

    /// 설정 유효성 검증
    pub async fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.proxy.validate()?;
        self.docker.validate()?;
        self.tls.validate(self.server.https_enabled).await?;
        Ok(())
    }

    /// 설정 디렉토리의 모든 JSON 파일을 읽어 동적 구성을 만듭니다.
    ///
    /// 파일은 이름순으로 처리되어 같은 입력이면 항상 같은 구성이
    /// 만들어집니다.
    pub async fn load_dynamic_config(&self) -> Result<DynamicConfig> {
        let mut dynamic = DynamicConfig::new();

        let Some(dir) = &self.config_dir else {
            debug!("동적 설정 디렉토리가 지정되지 않음");
            return Ok(dynamic);
        };

        let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|e| {
            SettingsError::FileError {
                path: dir.clone(),
                error: e,
            }
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            SettingsError::FileError {
                path: dir.clone(),
                error: e,
            }
        })? {
            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let config = JsonConfig::from_file(path).await?;
            dynamic.merge_json(config)?;
        }

        info!(file_count = paths.len(), "동적 설정 로드 완료");
        Ok(dynamic)
    }
}
