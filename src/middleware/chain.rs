use std::sync::Arc;

use super::{Middleware, MiddlewareError, Request, Response};

/// 미들웨어를 선언 순서대로 적용하는 체인입니다.
///
/// 요청은 선언 순서대로, 응답은 역순으로 통과합니다. 요청 단계에서
/// 미들웨어가 `Err`를 반환하면 나머지 미들웨어와 백엔드 호출은
/// 실행되지 않습니다.
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub async fn handle_request(&self, mut request: Request) -> Result<Request, MiddlewareError> {
        for middleware in &self.middlewares {
            request = middleware.handle_request(request).await?;
        }
        Ok(request)
    }

    pub async fn handle_response(&self, mut response: Response) -> Result<Response, MiddlewareError> {
        // 응답은 역순으로 처리
        for middleware in self.middlewares.iter().rev() {
            response = middleware.handle_response(response).await?;
        }
        Ok(response)
    }
}
