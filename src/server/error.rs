use std::fmt;

use crate::discovery::DiscoveryError;
use crate::middleware::MiddlewareError;
use crate::router::ValidationErrors;
use crate::settings::SettingsError;
use crate::tls::TlsError;

#[derive(Debug)]
pub enum Error {
    Settings(SettingsError),
    Io(std::io::Error),
    Tls(TlsError),
    Discovery(DiscoveryError),
    /// 리로드 거부. 이전 스냅샷이 유지됩니다.
    Validation(ValidationErrors),
    Middleware(MiddlewareError),
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::Settings(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<TlsError> for Error {
    fn from(err: TlsError) -> Self {
        Error::Tls(err)
    }
}

impl From<DiscoveryError> for Error {
    fn from(err: DiscoveryError) -> Self {
        Error::Discovery(err)
    }
}

impl From<ValidationErrors> for Error {
    fn from(err: ValidationErrors) -> Self {
        Error::Validation(err)
    }
}

impl From<MiddlewareError> for Error {
    fn from(err: MiddlewareError) -> Self {
        Error::Middleware(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Settings(e) => write!(f, "설정 오류: {}", e),
            Error::Io(e) => write!(f, "IO 오류: {}", e),
            Error::Tls(e) => write!(f, "TLS 오류: {}", e),
            Error::Discovery(e) => write!(f, "디스커버리 오류: {}", e),
            Error::Validation(e) => write!(f, "{}", e),
            Error::Middleware(e) => write!(f, "미들웨어 오류: {}", e),
        }
    }
}

impl std::error::Error for Error {}
