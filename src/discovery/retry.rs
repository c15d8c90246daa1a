use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::warn;

use super::error::DiscoveryError;

/// 재시도 정책
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간격
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// 재시도 가능한 작업 특성
#[async_trait]
pub trait RetryableOperation {
    type Output;

    /// 작업 실행
    async fn execute(&self) -> Result<Self::Output, DiscoveryError>;

    /// 재시도 여부 결정
    fn should_retry(&self, error: &DiscoveryError) -> bool {
        error.is_retryable()
    }
}

/// 재시도 로직 실행
pub async fn with_retry<T: RetryableOperation>(
    operation: T,
    policy: RetryPolicy,
) -> Result<T::Output, DiscoveryError> {
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation.execute().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempts >= policy.max_attempts || !operation.should_retry(&error) {
                    return Err(error);
                }

                warn!(
                    error = %error,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    "작업 실패, 재시도 예정"
                );

                sleep(policy.interval).await;
            }
        }
    }
}
