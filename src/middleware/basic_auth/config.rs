use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 자격증명 소스입니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthSource {
    /// 설정에 인라인으로 포함된 사용자 목록
    #[default]
    Inline,
    /// .htpasswd 형식 파일
    Htpasswd(String),
}

/// Basic 인증 설정입니다.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BasicAuthConfig {
    /// 사용자 이름 → 해시된 비밀번호
    #[serde(default)]
    pub users: HashMap<String, String>,

    /// WWW-Authenticate 헤더에 노출되는 realm
    #[serde(default = "default_realm")]
    pub realm: String,

    /// 자격증명 소스
    #[serde(default)]
    pub source: AuthSource,
}

fn default_realm() -> String {
    "gateway".to_string()
}

impl BasicAuthConfig {
    /// 평탄한 설정 맵에서 설정을 생성합니다.
    ///
    /// `basicAuth.users`는 `user:hash`를 콤마로 나열한 형식이고,
    /// `basicAuth.usersFile`은 .htpasswd 파일 경로입니다.
    pub fn from_flat_map(settings: &HashMap<String, String>) -> Result<Self, String> {
        let mut config = Self {
            users: HashMap::new(),
            realm: default_realm(),
            source: AuthSource::Inline,
        };

        if let Some(users) = settings.get("basicAuth.users") {
            for entry in users.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (user, hash) = entry.split_once(':')
                    .ok_or_else(|| format!("잘못된 사용자 형식: {}", entry))?;
                config.users.insert(user.to_string(), hash.to_string());
            }
        }

        if let Some(path) = settings.get("basicAuth.usersFile") {
            config.source = AuthSource::Htpasswd(path.clone());
        }

        if let Some(realm) = settings.get("basicAuth.realm") {
            config.realm = realm.clone();
        }

        if config.users.is_empty() && config.source == AuthSource::Inline {
            return Err("basic-auth에 사용자 또는 usersFile이 필요함".to_string());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_users_parsed() {
        let mut settings = HashMap::new();
        settings.insert(
            "basicAuth.users".to_string(),
            "admin:$2y$05$hash1, guest:$2y$05$hash2".to_string(),
        );

        let config = BasicAuthConfig::from_flat_map(&settings).unwrap();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users["admin"], "$2y$05$hash1");
        assert_eq!(config.users["guest"], "$2y$05$hash2");
    }

    #[test]
    fn test_users_file_source() {
        let mut settings = HashMap::new();
        settings.insert("basicAuth.usersFile".to_string(), "/etc/gateway/htpasswd".to_string());

        let config = BasicAuthConfig::from_flat_map(&settings).unwrap();
        assert_eq!(config.source, AuthSource::Htpasswd("/etc/gateway/htpasswd".to_string()));
    }

    #[test]
    fn test_missing_users_rejected() {
        let settings = HashMap::new();
        assert!(BasicAuthConfig::from_flat_map(&settings).is_err());
    }
}
