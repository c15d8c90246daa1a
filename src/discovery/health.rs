use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, Duration};
use tracing::{debug, info, warn};

use crate::registry::ServiceRegistry;
use crate::settings::HealthCheckSettings;

/// TCP 연결 프로브로 인스턴스 상태를 능동적으로 점검합니다.
///
/// 전달 단계의 수동적 서킷 브레이킹과 별개로, 주기적으로 모든
/// 인스턴스에 연결을 시도해 죽은 인스턴스를 내리고 복구된
/// 인스턴스를 되살립니다.
pub struct HealthProber {
    registry: Arc<ServiceRegistry>,
    settings: HealthCheckSettings,
}

impl HealthProber {
    pub fn new(registry: Arc<ServiceRegistry>, settings: HealthCheckSettings) -> Self {
        Self { registry, settings }
    }

    pub async fn run(self) {
        if !self.settings.enabled {
            debug!("능동 헬스 체크 비활성화됨");
            return;
        }

        info!(
            interval_secs = self.settings.interval,
            timeout_secs = self.settings.timeout,
            "능동 헬스 체크 시작"
        );

        let mut ticker = interval(Duration::from_secs(self.settings.interval));
        let probe_timeout = Duration::from_secs(self.settings.timeout);

        loop {
            ticker.tick().await;
            self.probe_all(probe_timeout).await;
        }
    }

    async fn probe_all(&self, probe_timeout: Duration) {
        for service in self.registry.snapshot() {
            for instance in service.instances() {
                let address = instance.address;
                let reachable = matches!(
                    timeout(probe_timeout, TcpStream::connect(address)).await,
                    Ok(Ok(_))
                );

                if reachable != instance.is_healthy() {
                    if reachable {
                        info!(service = %service.name, address = %address, "인스턴스 복구 감지");
                    } else {
                        warn!(service = %service.name, address = %address, "인스턴스 응답 없음");
                    }
                }

                self.registry.mark_health(&service.name, address, reachable);
            }
        }
    }
}
