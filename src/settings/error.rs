use std::fmt;

#[derive(Debug)]
pub enum SettingsError {
    EnvVarMissing {
        var_name: String,
    },
    EnvVarInvalid {
        var_name: String,
        value: String,
        reason: String,
    },
    FileError {
        path: String,
        error: std::io::Error,
    },
    ParseError {
        source: toml::de::Error,
    },
    JsonParseError {
        source: serde_json::Error,
    },
    /// JSON 스키마 검증 실패. 모든 위반 사항을 모아 보고합니다.
    SchemaError {
        path: String,
        errors: Vec<String>,
    },
    ValidationError {
        field: String,
        message: String,
    },
    DuplicateMiddleware(String),
    WatchError(String),
    InvalidConfig(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVarMissing { var_name } =>
                write!(f, "환경 변수 누락: {}", var_name),
            Self::EnvVarInvalid { var_name, value, reason } =>
                write!(f, "환경 변수 {} 값 {} 오류: {}", var_name, value, reason),
            Self::FileError { path, error } =>
                write!(f, "설정 파일 {} 오류: {}", path, error),
            Self::ParseError { source } =>
                write!(f, "설정 파싱 오류: {}", source),
            Self::JsonParseError { source } =>
                write!(f, "JSON 파싱 오류: {}", source),
            Self::SchemaError { path, errors } =>
                write!(f, "설정 {} 스키마 검증 실패: {}", path, errors.join("; ")),
            Self::ValidationError { field, message } =>
                write!(f, "설정 필드 {} 오류: {}", field, message),
            Self::DuplicateMiddleware(name) =>
                write!(f, "중복된 미들웨어 이름: {}", name),
            Self::WatchError(message) =>
                write!(f, "설정 감시 오류: {}", message),
            Self::InvalidConfig(message) =>
                write!(f, "유효하지 않은 설정: {}", message),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source } => Some(source),
            Self::JsonParseError { source } => Some(source),
            Self::FileError { error, .. } => Some(error),
            _ => None,
        }
    }
}
