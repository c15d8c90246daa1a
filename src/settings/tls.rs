use serde::Deserialize;
use std::env;
use super::SettingsError;

/// 도메인 하나의 인증서/키 경로입니다.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateSettings {
    pub domain: String,
    pub cert_path: String,
    pub key_path: String,
}

/// 기본(폴백) 인증서 경로입니다.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultCertificateSettings {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TlsSettings {
    /// 도메인별 인증서 목록 (SNI 매칭 대상)
    #[serde(default)]
    pub certificates: Vec<CertificateSettings>,

    /// SNI 미스 시 사용되는 기본 인증서
    #[serde(default)]
    pub default_certificate: Option<DefaultCertificateSettings>,
}

impl TlsSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let default_certificate = match (env::var("GATEWAY_TLS_CERT"), env::var("GATEWAY_TLS_KEY")) {
            (Ok(cert_path), Ok(key_path)) => Some(DefaultCertificateSettings {
                cert_path,
                key_path,
            }),
            _ => None,
        };

        Ok(Self {
            certificates: Vec::new(),
            default_certificate,
        })
    }

    /// 인증서 파일이 실제로 존재하는지 검증합니다.
    pub async fn validate(&self, https_enabled: bool) -> Result<(), SettingsError> {
        if !https_enabled {
            return Ok(());
        }

        if self.certificates.is_empty() && self.default_certificate.is_none() {
            return Err(SettingsError::ValidationError {
                field: "tls".to_string(),
                message: "HTTPS가 활성화됐지만 인증서가 없습니다".to_string(),
            });
        }

        for cert in &self.certificates {
            check_file(&cert.cert_path).await?;
            check_file(&cert.key_path).await?;
        }

        if let Some(default) = &self.default_certificate {
            check_file(&default.cert_path).await?;
            check_file(&default.key_path).await?;
        }

        Ok(())
    }
}

async fn check_file(path: &str) -> Result<(), SettingsError> {
    tokio::fs::metadata(path).await.map_err(|e| SettingsError::FileError {
        path: path.to_string(),
        error: e,
    })?;
    Ok(())
}
