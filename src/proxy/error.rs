use std::net::SocketAddr;
use hyper::StatusCode;
use tracing::error;

use crate::middleware::{full_body, Response};
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// 연결 단계 실패. 재시도 한도까지 다른 인스턴스로 재시도된 뒤의 최종 에러입니다.
    #[error("백엔드 {address} 연결 실패: {message}")]
    Connect {
        address: SocketAddr,
        message: String,
    },

    /// 응답 대기 시간 초과. 진행 중인 백엔드 호출은 취소됩니다.
    #[error("백엔드 {address} 응답 시간 초과 ({timeout_secs}초)")]
    ResponseTimeout {
        address: SocketAddr,
        timeout_secs: u64,
    },

    /// 연결 이후의 백엔드 요청 실패. 본문이 이미 소비됐을 수 있으므로 재시도하지 않습니다.
    #[error("백엔드 요청 실패: {0}")]
    Upstream(#[from] hyper::Error),

    #[error("프록시 요청 구성 실패: {0}")]
    Http(#[from] hyper::http::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Connect { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::ResponseTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Registry(RegistryError::NoHealthyBackend { .. })
            | ProxyError::Registry(RegistryError::UnknownService { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProxyError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 프록시 에러를 HTTP 응답으로 변환합니다.
pub fn error_response(err: &ProxyError) -> Response {
    hyper::Response::builder()
        .status(err.status())
        .body(full_body(err.to_string()))
        .unwrap_or_else(|e| {
            error!(error = %e, "에러 응답 생성 실패");
            let mut response = Response::new(full_body("Bad Gateway"));
            *response.status_mut() = StatusCode::BAD_GATEWAY;
            response
        })
}
