//! 백엔드 디스커버리 이벤트 스트림을 제공하는 모듈입니다.
//!
//! 엔진은 특정 컨테이너 런타임에 의존하지 않고 일반화된 이벤트
//! 스트림만 소비합니다. Docker 제공자는 그 스트림의 구현체 중
//! 하나입니다.

mod docker;
mod error;
mod health;
mod retry;

pub use docker::DockerDiscovery;
pub use error::DiscoveryError;
pub use health::HealthProber;
pub use retry::{with_retry, RetryPolicy, RetryableOperation};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::middleware::MiddlewareConfig;
use crate::registry::ServiceDefinition;
use crate::router::RouteDefinition;

/// 디스커버리 소스가 만들어내는 이벤트입니다.
///
/// 소스는 변경이 있을 때마다 전체 동적 구성을 다시 내보냅니다.
/// 부분 갱신이 없으므로 수신 측은 항상 일관된 전체 상태를 받습니다.
#[derive(Debug)]
pub enum DiscoveryEvent {
    /// 전체 동기화: 현재 발견된 라우트/서비스/미들웨어 정의
    Synced {
        routes: Vec<RouteDefinition>,
        services: Vec<ServiceDefinition>,
        middlewares: Vec<(String, MiddlewareConfig)>,
    },
    /// 복구 불가능한 디스커버리 오류
    Error(DiscoveryError),
}

/// 디스커버리 소스 트레이트
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// 이벤트 구독을 시작합니다. 첫 이벤트로 초기 전체 동기화가 전달됩니다.
    async fn subscribe(&self) -> mpsc::Receiver<DiscoveryEvent>;
}
