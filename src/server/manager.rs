use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::discovery::{DiscoveryEvent, DockerDiscovery, HealthProber, ServiceDiscovery};
use crate::middleware::MiddlewareManager;
use crate::registry::ServiceRegistry;
use crate::router::{RouterTable, SharedRouterTable};
use crate::settings::watcher::ConfigWatcher;
use crate::settings::{DynamicConfig, Settings};
use super::admin::AdminHandler;
use super::error::Error;
use super::handler::RequestHandler;
use super::listener::ServerListener;
use super::Result;

/// 리로드에 필요한 최신 동적 구성 상태입니다.
///
/// 파일 설정과 디스커버리 설정은 독립적으로 갱신되고, 둘을 합친
/// 구성이 하나의 스냅샷으로 검증/활성화됩니다.
struct ReloadState {
    version: AtomicU64,
    file_config: Mutex<DynamicConfig>,
    discovered_config: Mutex<DynamicConfig>,
}

/// 게이트웨이 전체를 조립하고 구동하는 매니저입니다.
pub struct ServerManager {
    pub settings: Settings,
    registry: Arc<ServiceRegistry>,
    table: Arc<SharedRouterTable>,
    middleware: Arc<ArcSwap<MiddlewareManager>>,
    state: Arc<ReloadState>,
}

impl ServerManager {
    /// 설정을 바탕으로 매니저를 생성하고 초기 스냅샷을 활성화합니다.
    ///
    /// 초기 동적 설정이 유효하지 않으면 기동이 실패합니다. 이후의
    /// 리로드 실패는 이전 스냅샷을 유지합니다.
    #[instrument(skip(settings), level = "debug", err)]
    pub async fn new(settings: Settings) -> Result<Self> {
        let registry = Arc::new(ServiceRegistry::new());
        let table = Arc::new(SharedRouterTable::new(RouterTable::empty(0)));
        let middleware = Arc::new(ArcSwap::from_pointee(MiddlewareManager::default()));

        let file_config = settings.load_dynamic_config().await?;
        let state = Arc::new(ReloadState {
            version: AtomicU64::new(0),
            file_config: Mutex::new(file_config),
            discovered_config: Mutex::new(DynamicConfig::new()),
        });

        apply_dynamic(&registry, &table, &middleware, &state).await?;

        Ok(Self {
            settings,
            registry,
            table,
            middleware,
            state,
        })
    }

    /// 디스커버리/감시 태스크를 시작하고 리스너 루프에 진입합니다.
    #[instrument(skip(self), level = "info", err)]
    pub async fn start(&mut self) -> Result<()> {
        if self.settings.docker.enabled {
            self.start_discovery().await?;
        }

        if self.settings.config_dir.is_some() {
            self.start_config_watcher()?;
        }

        let listener = ServerListener::new(&self.settings).await?;

        let handler = Arc::new(RequestHandler::new(
            self.table.clone(),
            self.registry.clone(),
            self.middleware.clone(),
            self.settings.proxy.to_proxy_config(),
        ));
        let admin_handler = Arc::new(AdminHandler::new(
            self.table.clone(),
            self.registry.clone(),
        ));

        listener.run(handler, admin_handler).await
    }

    /// Docker 디스커버리 이벤트 구독과 능동 헬스 체크를 시작합니다.
    async fn start_discovery(&self) -> Result<()> {
        let discovery = DockerDiscovery::new(self.settings.docker.clone()).await?;
        let mut event_rx = discovery.subscribe().await;

        let registry = self.registry.clone();
        let table = self.table.clone();
        let middleware = self.middleware.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    DiscoveryEvent::Synced { routes, services, middlewares } => {
                        {
                            let mut discovered = state.discovered_config.lock().await;
                            let mut next = DynamicConfig::new();
                            next.merge_discovered(routes, services, middlewares);
                            *discovered = next;
                        }

                        if let Err(e) = apply_dynamic(&registry, &table, &middleware, &state).await {
                            error!(error = %e, "디스커버리 구성 적용 거부, 이전 스냅샷 유지");
                        }
                    }
                    DiscoveryEvent::Error(e) => {
                        error!(error = %e, "디스커버리 오류");
                    }
                }
            }
            warn!("디스커버리 이벤트 스트림 종료");
        });

        if self.settings.docker.health_check.enabled {
            let prober = HealthProber::new(
                self.registry.clone(),
                self.settings.docker.health_check.clone(),
            );
            tokio::spawn(prober.run());
        }

        Ok(())
    }

    /// 동적 설정 디렉토리 감시를 시작합니다.
    fn start_config_watcher(&self) -> Result<()> {
        let config_dir = self.settings.config_dir.clone()
            .expect("호출 전에 config_dir 존재 확인됨");

        let mut watcher = ConfigWatcher::new();
        watcher.add_path(&config_dir);
        watcher.start()?;

        let settings = self.settings.clone();
        let registry = self.registry.clone();
        let table = self.table.clone();
        let middleware = self.middleware.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            info!(path = %config_dir, "설정 감시자 시작");

            while let Some(event) = watcher.watch().await {
                if event.path().extension().map_or(true, |ext| ext != "json") {
                    continue;
                }
                info!(path = %event.path().display(), "설정 파일 변경 감지");

                // 디렉토리 전체를 다시 읽어 부분 적용을 방지
                let reloaded = match settings.load_dynamic_config().await {
                    Ok(config) => config,
                    Err(e) => {
                        error!(error = %e, "동적 설정 로드 실패, 이전 설정 유지");
                        continue;
                    }
                };

                {
                    let mut file_config = state.file_config.lock().await;
                    *file_config = reloaded;
                }

                if let Err(e) = apply_dynamic(&registry, &table, &middleware, &state).await {
                    error!(error = %e, "설정 리로드 거부, 이전 스냅샷 유지");
                }
            }
        });

        Ok(())
    }
}

/// 파일 설정과 디스커버리 설정을 합쳐 새 스냅샷으로 활성화합니다.
///
/// 검증은 전부-아니면-전무입니다. 어떤 단계든 실패하면 레지스트리,
/// 미들웨어, 라우팅 테이블 어느 것도 변경되지 않습니다.
async fn apply_dynamic(
    registry: &ServiceRegistry,
    table: &SharedRouterTable,
    middleware: &ArcSwap<MiddlewareManager>,
    state: &ReloadState,
) -> Result<()> {
    let mut combined = state.file_config.lock().await.clone();
    {
        let discovered = state.discovered_config.lock().await;
        combined.merge_discovered(
            discovered.routes.clone(),
            discovered.services.clone(),
            discovered.middlewares.clone().into_iter().collect(),
        );
    }

    let manager = MiddlewareManager::new(&combined.middlewares, &combined.router_middlewares())
        .map_err(Error::Middleware)?;

    let known_services: HashSet<String> = combined.services.iter()
        .map(|service| service.name.clone())
        .collect();
    let known_middlewares = manager.middleware_names();

    let version = state.version.fetch_add(1, Ordering::SeqCst) + 1;
    let built = RouterTable::build(version, &combined.routes, &known_services, &known_middlewares)
        .map_err(Error::Validation)?;

    // 검증이 전부 통과한 뒤에만 공개 상태를 건드림
    registry.apply_definitions(&combined.services);
    middleware.store(Arc::new(manager));
    table.publish(built);

    info!(
        version = version,
        route_count = combined.routes.len(),
        service_count = combined.services.len(),
        "동적 구성 활성화"
    );
    Ok(())
}
