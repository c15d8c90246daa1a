use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// 토큰 버킷 구현
#[derive(Debug)]
struct TokenBucket {
    /// 현재 사용 가능한 토큰 수
    tokens: f64,
    /// 마지막 업데이트 시간
    last_update: Instant,
    /// 초당 보충되는 토큰 수 (rate)
    rate: f64,
    /// 최대 토큰 수 (capacity)
    capacity: f64,
}

impl TokenBucket {
    fn new(rate: f64, capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate,
            capacity,
        }
    }

    /// 토큰 하나를 소비하려고 시도합니다.
    ///
    /// 거부된 시도는 토큰을 소비하지 않습니다. 보충은 마지막 갱신
    /// 이후 경과 시간에 비례합니다.
    fn try_consume(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);

        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(self.capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// 다음 토큰이 사용 가능할 때까지 남은 시간을 반환합니다.
    fn time_to_next_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::from_secs(0)
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// 클라이언트 키별 토큰 버킷 저장소
///
/// 버킷은 미들웨어 인스턴스가 소유하고, 같은 키의 동시 요청은 쓰기
/// 잠금 안에서 순서대로 토큰을 소비합니다.
#[derive(Debug, Clone, Default)]
pub struct TokenBucketStore {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
}

impl TokenBucketStore {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 키에 대한 요청 하나를 처리할 수 있는지 확인하고 토큰을 소비합니다.
    pub async fn check_rate(&self, key: &str, rate: f64, capacity: f64) -> bool {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, rate = rate, capacity = capacity, "새로운 토큰 버킷 생성");
            TokenBucket::new(rate, capacity)
        });

        bucket.try_consume()
    }

    /// 다음 요청까지 대기해야 하는 시간을 반환합니다.
    pub async fn time_to_next_request(&self, key: &str) -> Option<Duration> {
        let buckets = self.buckets.read().await;
        buckets.get(key).map(|bucket| bucket.time_to_next_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_rejection() {
        let store = TokenBucketStore::new();

        for _ in 0..5 {
            assert!(store.check_rate("client", 1.0, 5.0).await);
        }
        assert!(!store.check_rate("client", 1.0, 5.0).await);
    }

    #[tokio::test]
    async fn test_rejected_attempt_consumes_nothing() {
        let store = TokenBucketStore::new();

        assert!(store.check_rate("client", 1.0, 1.0).await);
        // 거부가 반복돼도 대기 시간이 늘어나지 않아야 함
        assert!(!store.check_rate("client", 1.0, 1.0).await);
        let first_wait = store.time_to_next_request("client").await.unwrap();
        assert!(!store.check_rate("client", 1.0, 1.0).await);
        let second_wait = store.time_to_next_request("client").await.unwrap();

        assert!(second_wait <= first_wait);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = TokenBucketStore::new();

        assert!(store.check_rate("a", 1.0, 1.0).await);
        assert!(!store.check_rate("a", 1.0, 1.0).await);
        assert!(store.check_rate("b", 1.0, 1.0).await);
    }
}
