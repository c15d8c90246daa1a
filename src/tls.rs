//! TLS 종료를 담당하는 모듈입니다.
//!
//! 도메인별 인증서 저장소를 만들고, SNI로 인증서를 찾는 리졸버를
//! 제공합니다. 매칭되는 SNI가 없으면 기본 인증서로 폴백하고, 기본
//! 인증서도 없으면 핸드쉐이크가 거부됩니다.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio_rustls::rustls::{self, Certificate, PrivateKey};
use tokio_rustls::rustls::server::{ClientHello, ResolvesServerCert};
use tokio_rustls::rustls::sign::{any_supported_type, CertifiedKey};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::settings::TlsSettings;

#[derive(Debug)]
pub enum TlsError {
    FileError {
        path: String,
        error: std::io::Error,
    },
    InvalidCertificate {
        path: String,
        reason: String,
    },
    NoCertificates,
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::FileError { path, error } =>
                write!(f, "인증서 파일 {} 오류: {}", path, error),
            TlsError::InvalidCertificate { path, reason } =>
                write!(f, "유효하지 않은 인증서 {}: {}", path, reason),
            TlsError::NoCertificates =>
                write!(f, "사용 가능한 인증서가 없음"),
        }
    }
}

impl std::error::Error for TlsError {}

/// 도메인 → 인증서 매핑과 기본 인증서를 보관합니다.
///
/// 인증서의 수명 주기는 라우트와 무관합니다. 라우트 리로드는 인증서
/// 저장소를 건드리지 않습니다.
pub struct CertificateStore {
    by_domain: HashMap<String, Arc<CertifiedKey>>,
    default: Option<Arc<CertifiedKey>>,
}

impl CertificateStore {
    /// TLS 설정에서 인증서 저장소를 구성합니다.
    pub fn from_settings(settings: &TlsSettings) -> Result<Self, TlsError> {
        let mut by_domain = HashMap::new();

        for cert in &settings.certificates {
            let key = load_certified_key(&cert.cert_path, &cert.key_path)?;
            debug!(domain = %cert.domain, cert = %cert.cert_path, "인증서 로드");
            by_domain.insert(cert.domain.to_lowercase(), Arc::new(key));
        }

        let default = match &settings.default_certificate {
            Some(cert) => {
                let key = load_certified_key(&cert.cert_path, &cert.key_path)?;
                Some(Arc::new(key))
            }
            None => None,
        };

        if by_domain.is_empty() && default.is_none() {
            return Err(TlsError::NoCertificates);
        }

        info!(
            domain_count = by_domain.len(),
            has_default = default.is_some(),
            "인증서 저장소 구성 완료"
        );

        Ok(Self { by_domain, default })
    }

    /// SNI 이름으로 인증서를 찾습니다.
    ///
    /// 정확한 도메인 → 와일드카드(첫 레이블 제거) 순서로 찾고,
    /// 없으면 기본 인증서를 반환합니다.
    pub fn lookup(&self, server_name: &str) -> Option<Arc<CertifiedKey>> {
        let name = server_name.to_lowercase();

        if let Some(key) = self.by_domain.get(&name) {
            return Some(key.clone());
        }

        if let Some((_, rest)) = name.split_once('.') {
            if let Some(key) = self.by_domain.get(&format!("*.{}", rest)) {
                return Some(key.clone());
            }
        }

        self.default.clone()
    }

    pub fn default_certificate(&self) -> Option<Arc<CertifiedKey>> {
        self.default.clone()
    }
}

/// SNI 기반 인증서 리졸버입니다.
///
/// `None`을 반환하면 rustls가 핸드쉐이크를 거부합니다.
pub struct SniCertResolver {
    store: Arc<CertificateStore>,
}

impl SniCertResolver {
    pub fn new(store: Arc<CertificateStore>) -> Self {
        Self { store }
    }
}

impl ResolvesServerCert for SniCertResolver {
    fn resolve(&self, client_hello: ClientHello) -> Option<Arc<CertifiedKey>> {
        match client_hello.server_name() {
            Some(name) => {
                let resolved = self.store.lookup(name);
                if resolved.is_none() {
                    warn!(sni = %name, "매칭되는 인증서와 기본 인증서가 모두 없음");
                }
                resolved
            }
            None => self.store.default_certificate(),
        }
    }
}

/// 인증서 저장소로 TLS acceptor를 만듭니다.
pub fn build_acceptor(store: Arc<CertificateStore>) -> TlsAcceptor {
    let config = rustls::ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(SniCertResolver::new(store)));

    TlsAcceptor::from(Arc::new(config))
}

fn load_certified_key(cert_path: &str, key_path: &str) -> Result<CertifiedKey, TlsError> {
    let cert_file = File::open(cert_path).map_err(|e| TlsError::FileError {
        path: cert_path.to_string(),
        error: e,
    })?;
    let mut cert_reader = BufReader::new(cert_file);
    let certs: Vec<Certificate> = rustls_pemfile::certs(&mut cert_reader)
        .map_err(|e| TlsError::FileError {
            path: cert_path.to_string(),
            error: e,
        })?
        .into_iter()
        .map(Certificate)
        .collect();

    if certs.is_empty() {
        return Err(TlsError::InvalidCertificate {
            path: cert_path.to_string(),
            reason: "인증서를 찾을 수 없음".to_string(),
        });
    }

    let key_file = File::open(key_path).map_err(|e| TlsError::FileError {
        path: key_path.to_string(),
        error: e,
    })?;
    let mut key_reader = BufReader::new(key_file);
    let key = rustls_pemfile::pkcs8_private_keys(&mut key_reader)
        .map_err(|e| TlsError::FileError {
            path: key_path.to_string(),
            error: e,
        })?
        .into_iter()
        .next()
        .ok_or_else(|| TlsError::InvalidCertificate {
            path: key_path.to_string(),
            reason: "개인키를 찾을 수 없음".to_string(),
        })?;

    let signing_key = any_supported_type(&PrivateKey(key))
        .map_err(|e| TlsError::InvalidCertificate {
            path: key_path.to_string(),
            reason: e.to_string(),
        })?;

    Ok(CertifiedKey::new(certs, signing_key))
}
