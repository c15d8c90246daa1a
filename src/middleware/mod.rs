//! 요청/응답 변환 미들웨어 체인을 제공하는 모듈입니다.
//!
//! 각 미들웨어는 요청 단계와 응답 단계를 가지며, 요청 단계에서
//! 에러를 반환해 체인을 중단할 수 있습니다 (인증 거부, 요청 한도
//! 초과 등). 중단 에러는 경계에서 터미널 응답(401/429 등)으로
//! 변환됩니다.

pub mod basic_auth;
pub mod chain;
pub mod config;
pub mod cors;
pub mod error;
pub mod headers;
pub mod manager;
pub mod rate_limit;
pub mod response;
pub mod strip_prefix;
pub mod traits;

pub use chain::MiddlewareChain;
pub use config::{MiddlewareConfig, MiddlewareType};
pub use error::MiddlewareError;
pub use manager::MiddlewareManager;
pub use response::handle_middleware_error;
pub use traits::Middleware;

use std::net::SocketAddr;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;

/// 요청/응답 본문 타입. 고정 버퍼와 스트리밍 본문을 모두 담습니다.
pub type Body = BoxBody<Bytes, hyper::Error>;
pub type ResponseBody = Body;
pub type Request = hyper::Request<Body>;
pub type Response = hyper::Response<Body>;

/// 고정 바이트 본문을 응답 본문 타입으로 변환합니다.
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// 리스너가 요청 확장에 삽입하는 클라이언트 연결 정보입니다.
///
/// 전달 헤더 주입(X-Forwarded-*)과 요청 한도 키 결정에 사용됩니다.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfo {
    pub peer_addr: SocketAddr,
    pub scheme: &'static str,
}
