use std::fmt;
use std::net::SocketAddr;

/// 서비스 레지스트리 에러를 표현하는 열거형입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 등록되지 않은 서비스
    UnknownService {
        service: String,
    },
    /// 정상 상태의 백엔드 인스턴스 없음
    NoHealthyBackend {
        service: String,
    },
    /// 동일한 (주소, 포트) 인스턴스 중복 등록
    DuplicateInstance {
        service: String,
        address: SocketAddr,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownService { service } =>
                write!(f, "등록되지 않은 서비스: {}", service),
            RegistryError::NoHealthyBackend { service } =>
                write!(f, "서비스 {}에 정상 상태의 백엔드가 없음", service),
            RegistryError::DuplicateInstance { service, address } =>
                write!(f, "서비스 {}에 이미 등록된 인스턴스: {}", service, address),
        }
    }
}

impl std::error::Error for RegistryError {}
