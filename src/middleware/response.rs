use hyper::{header, StatusCode};
use tracing::error;

use super::{full_body, MiddlewareError, Response};

/// 미들웨어 중단 에러를 터미널 HTTP 응답으로 변환합니다.
///
/// 명시적 거부(401/403/429)는 미들웨어가 정의한 정상적인 종료이고,
/// 설정/실행 오류만 5xx로 처리됩니다.
pub fn handle_middleware_error(err: MiddlewareError) -> Response {
    let builder = match &err {
        MiddlewareError::Unauthorized { realm, .. } => {
            hyper::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", realm))
        }
        MiddlewareError::TooManyRequests { limit, retry_after_secs } => {
            hyper::Response::builder()
                .status(StatusCode::TOO_MANY_REQUESTS)
                .header("X-RateLimit-Limit", limit.to_string())
                .header(header::RETRY_AFTER, retry_after_secs.to_string())
        }
        MiddlewareError::ForbiddenOrigin { .. } => {
            hyper::Response::builder().status(StatusCode::FORBIDDEN)
        }
        MiddlewareError::CorsPreflight {
            origin,
            allow_methods,
            allow_headers,
            max_age,
            allow_credentials,
        } => {
            let mut builder = hyper::Response::builder()
                .status(StatusCode::NO_CONTENT)
                .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_str())
                .header(header::ACCESS_CONTROL_ALLOW_METHODS, allow_methods.as_str());
            if let Some(headers) = allow_headers {
                builder = builder.header(header::ACCESS_CONTROL_ALLOW_HEADERS, headers.as_str());
            }
            if let Some(max_age) = max_age {
                builder = builder.header(header::ACCESS_CONTROL_MAX_AGE, max_age.to_string());
            }
            if *allow_credentials {
                builder = builder.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
            }
            return builder
                .body(full_body(""))
                .unwrap_or_else(|e| {
                    error!(error = %e, "preflight 응답 생성 실패");
                    Response::new(full_body(""))
                });
        }
        MiddlewareError::Config(_) | MiddlewareError::Execution { .. } => {
            hyper::Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR)
        }
        MiddlewareError::Hyper(_) => {
            hyper::Response::builder().status(StatusCode::BAD_GATEWAY)
        }
    };

    builder
        .body(full_body(err.to_string()))
        .unwrap_or_else(|e| {
            error!(error = %e, "에러 응답 생성 실패");
            let mut response = Response::new(full_body("Internal Server Error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}
