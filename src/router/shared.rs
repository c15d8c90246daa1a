use std::sync::Arc;
use arc_swap::ArcSwap;
use tracing::info;

use crate::router::table::RouterTable;

/// 활성 라우팅 테이블을 원자적으로 교체 가능한 포인터로 보관합니다.
///
/// 읽기 경로(요청 매칭)는 `load`로 스냅샷을 가져와 그 스냅샷만 보고,
/// 리로드는 완전히 빌드된 새 테이블을 `publish`로 교체합니다. 진행
/// 중인 요청은 항상 교체 전 또는 교체 후의 온전한 테이블만 봅니다.
pub struct SharedRouterTable {
    inner: ArcSwap<RouterTable>,
}

impl SharedRouterTable {
    pub fn new(table: RouterTable) -> Self {
        Self {
            inner: ArcSwap::from_pointee(table),
        }
    }

    /// 현재 활성 스냅샷을 반환합니다.
    pub fn load(&self) -> Arc<RouterTable> {
        self.inner.load_full()
    }

    /// 새 스냅샷을 활성화합니다.
    pub fn publish(&self, table: RouterTable) {
        let version = table.version();
        let route_count = table.routes().len();
        self.inner.store(Arc::new(table));
        info!(version = version, route_count = route_count, "라우팅 테이블 활성화");
    }

    pub fn version(&self) -> u64 {
        self.inner.load().version()
    }
}
