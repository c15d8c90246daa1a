use std::collections::HashMap;
use std::fs;

use crate::middleware::MiddlewareError;
use super::config::{AuthSource, BasicAuthConfig};

/// Basic 인증을 위한 인증기 트레이트
///
/// # 지원하는 해시 알고리즘
/// - bcrypt ($2a$, $2b$, $2y$ 접두사)
pub trait Authenticator: Send + Sync {
    /// 사용자 자격증명을 검증합니다.
    fn verify_credentials(&self, username: &str, password: &str) -> bool;
}

fn verify_password(password: &str, hash: &str) -> bool {
    if hash.starts_with("$2") {
        bcrypt::verify(password, hash).unwrap_or(false)
    } else {
        false
    }
}

/// 설정에 인라인으로 포함된 사용자 목록 기반 인증기
pub struct InlineAuthenticator {
    users: HashMap<String, String>,
}

impl InlineAuthenticator {
    pub fn new(config: &BasicAuthConfig) -> Self {
        Self {
            users: config.users.clone(),
        }
    }
}

impl Authenticator for InlineAuthenticator {
    fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false)
    }
}

/// .htpasswd 파일 기반 인증기
///
/// # 예시
/// ```text
/// # .htpasswd 파일 형식
/// user1:$2y$05$c4WoMPo3SXsafkva.HHa6uXQZWr7oboPiC2bT/r7q1BB8I2s0BRqC
/// user2:$2b$05$LgzK4lXJzxGHVoJ0KhO1E.eQE9L5.H4TD/w0Nz8cP6b/U.ik2M0FW
/// ```
pub struct HtpasswdAuthenticator {
    users: HashMap<String, String>,
}

impl HtpasswdAuthenticator {
    pub fn load(path: &str) -> Result<Self, MiddlewareError> {
        let content = fs::read_to_string(path).map_err(|e| MiddlewareError::Config(
            format!("htpasswd 파일 읽기 실패 {}: {}", path, e)
        ))?;

        let mut users = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((username, hash)) = line.split_once(':') {
                users.insert(username.to_string(), hash.to_string());
            }
        }

        Ok(Self { users })
    }
}

impl Authenticator for HtpasswdAuthenticator {
    fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false)
    }
}

/// 설정에 맞는 인증기를 생성합니다.
pub fn create_authenticator(config: &BasicAuthConfig) -> Result<Box<dyn Authenticator>, MiddlewareError> {
    match &config.source {
        AuthSource::Inline => Ok(Box::new(InlineAuthenticator::new(config))),
        AuthSource::Htpasswd(path) => Ok(Box::new(HtpasswdAuthenticator::load(path)?)),
    }
}
