#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("미들웨어 설정 오류: {0}")]
    Config(String),

    #[error("인증 실패: {reason}")]
    Unauthorized {
        realm: String,
        reason: String,
    },

    #[error("요청 한도 초과")]
    TooManyRequests {
        limit: u32,
        retry_after_secs: u64,
    },

    #[error("허용되지 않은 출처: {origin}")]
    ForbiddenOrigin {
        origin: String,
    },

    /// CORS preflight 종결. 실패가 아니라 체인에서 요청을 끝내는 수단입니다.
    #[error("CORS preflight 응답")]
    CorsPreflight {
        origin: String,
        allow_methods: String,
        allow_headers: Option<String>,
        max_age: Option<u32>,
        allow_credentials: bool,
    },

    #[error("미들웨어 {middleware} 실행 실패: {message}")]
    Execution {
        middleware: String,
        message: String,
    },

    #[error(transparent)]
    Hyper(#[from] hyper::Error),
}
