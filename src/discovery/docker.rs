use std::collections::HashMap;
use std::net::SocketAddr;
use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::models::{ContainerSummary, EventMessageTypeEnum};
use bollard::system::EventsOptions;
use bollard::Docker;
use futures_util::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::middleware::MiddlewareConfig;
use crate::registry::{InstanceDefinition, LoadBalancerStrategy, ServiceDefinition};
use crate::router::RouteDefinition;
use crate::settings::DockerSettings;
use super::error::DiscoveryError;
use super::retry::{with_retry, RetryPolicy, RetryableOperation};
use super::{DiscoveryEvent, ServiceDiscovery};

/// 컨테이너 라벨을 동적 구성으로 변환하는 Docker 디스커버리 제공자입니다.
///
/// `<prefix>http.routers.<이름>.rule` 형식의 라벨을 읽어 라우트와
/// 서비스 정의를 만들고, 컨테이너 생명주기 이벤트마다 전체 구성을
/// 다시 동기화합니다.
#[derive(Clone)]
pub struct DockerDiscovery {
    docker: Docker,
    settings: DockerSettings,
}

impl DockerDiscovery {
    /// Docker 클라이언트를 초기화합니다.
    pub async fn new(settings: DockerSettings) -> Result<Self, DiscoveryError> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            DiscoveryError::ConnectionError {
                source: e,
                context: "로컬 Docker 데몬 연결".to_string(),
            }
        })?;
        Ok(Self { docker, settings })
    }

    /// 현재 컨테이너 상태를 동적 구성으로 동기화합니다. 실패 시 재시도합니다.
    pub async fn sync(&self) -> Result<DiscoveryEvent, DiscoveryError> {
        let operation = SyncOperation { discovery: self };
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        with_retry(operation, policy).await
    }

    async fn try_sync(&self) -> Result<DiscoveryEvent, DiscoveryError> {
        let label_filter = format!("{}enable=true", self.settings.label_prefix);
        let options = Some(ListContainersOptions::<String> {
            all: false,
            filters: {
                let mut filters = HashMap::new();
                filters.insert("label".to_string(), vec![label_filter]);
                filters
            },
            ..Default::default()
        });

        let containers = self.docker.list_containers(options).await.map_err(|e| {
            DiscoveryError::ListContainersError {
                source: e,
                context: "라우팅 가능한 컨테이너 조회".to_string(),
            }
        })?;

        info!(count = containers.len(), "컨테이너 목록 조회 성공");
        self.extract_definitions(&containers)
    }

    /// 컨테이너 목록에서 라우트/서비스/미들웨어 정의를 추출합니다.
    fn extract_definitions(
        &self,
        containers: &[ContainerSummary],
    ) -> Result<DiscoveryEvent, DiscoveryError> {
        let mut routes: HashMap<String, RouteDefinition> = HashMap::new();
        let mut services: HashMap<String, ServiceDefinition> = HashMap::new();
        let mut middlewares: HashMap<String, MiddlewareConfig> = HashMap::new();

        for container in containers {
            let container_id = container.id.as_deref().unwrap_or("unknown");

            if container.state.as_deref() != Some("running") {
                debug!(container_id = %container_id, "실행 중이 아닌 컨테이너 건너뜀");
                continue;
            }

            let Some(labels) = container.labels.as_ref() else {
                continue;
            };

            let address = match self.container_address(container) {
                Ok(address) => address,
                Err(e) => {
                    warn!(error = %e, container_id = %container_id, "컨테이너 주소 확인 실패");
                    continue;
                }
            };

            if let Err(e) = self.collect_container_definitions(
                container_id,
                labels,
                &address,
                &mut routes,
                &mut services,
            ) {
                error!(error = %e, container_id = %container_id, "컨테이너 라벨 처리 실패");
                return Err(e);
            }

            match MiddlewareConfig::from_labels(labels, &self.settings.label_prefix) {
                Ok(configs) => {
                    for (name, config) in configs {
                        middlewares.insert(name, config);
                    }
                }
                Err(reason) => {
                    return Err(DiscoveryError::LabelError {
                        container_id: container_id.to_string(),
                        reason,
                    });
                }
            }
        }

        // 결정적 순서: 이름순 정렬이 발견된 라우트의 선언 순서가 됨
        let mut route_list: Vec<RouteDefinition> = routes.into_values().collect();
        route_list.sort_by(|a, b| a.id.cmp(&b.id));
        let mut service_list: Vec<ServiceDefinition> = services.into_values().collect();
        service_list.sort_by(|a, b| a.name.cmp(&b.name));
        let mut middleware_list: Vec<(String, MiddlewareConfig)> = middlewares.into_iter().collect();
        middleware_list.sort_by(|(a, _), (b, _)| a.cmp(b));

        if route_list.is_empty() {
            warn!("발견된 라우트가 없음");
        } else {
            info!(
                route_count = route_list.len(),
                service_count = service_list.len(),
                "컨테이너 라벨에서 동적 구성 추출 완료"
            );
        }

        Ok(DiscoveryEvent::Synced {
            routes: route_list,
            services: service_list,
            middlewares: middleware_list,
        })
    }

    /// 단일 컨테이너의 라우터/서비스 라벨을 정의에 반영합니다.
    fn collect_container_definitions(
        &self,
        container_id: &str,
        labels: &HashMap<String, String>,
        address: &str,
        routes: &mut HashMap<String, RouteDefinition>,
        services: &mut HashMap<String, ServiceDefinition>,
    ) -> Result<(), DiscoveryError> {
        let router_prefix = format!("{}http.routers.", self.settings.label_prefix);
        let service_prefix = format!("{}http.services.", self.settings.label_prefix);

        let mut router_names: Vec<String> = labels.keys()
            .filter_map(|key| key.strip_prefix(&router_prefix))
            .filter_map(|rest| rest.split('.').next())
            .map(str::to_string)
            .collect();
        router_names.sort();
        router_names.dedup();

        for router_name in router_names {
            let rule_key = format!("{}{}.rule", router_prefix, router_name);
            let rule = labels.get(&rule_key).ok_or_else(|| DiscoveryError::LabelError {
                container_id: container_id.to_string(),
                reason: format!("라우터 {}에 rule 라벨이 없음", router_name),
            })?;

            let service_name = labels
                .get(&format!("{}{}.service", router_prefix, router_name))
                .cloned()
                .unwrap_or_else(|| router_name.clone());

            let middlewares: Vec<String> = labels
                .get(&format!("{}{}.middlewares", router_prefix, router_name))
                .map(|value| {
                    value.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            let priority = labels
                .get(&format!("{}{}.priority", router_prefix, router_name))
                .and_then(|value| value.parse().ok());

            routes.insert(router_name.clone(), RouteDefinition {
                id: router_name.clone(),
                rule: rule.clone(),
                service: service_name.clone(),
                middlewares,
                priority,
            });

            // 서비스 인스턴스: 컨테이너 주소 + 포트 라벨
            let port: u16 = labels
                .get(&format!("{}{}.loadbalancer.server.port", service_prefix, service_name))
                .and_then(|value| value.parse().ok())
                .unwrap_or(80);
            let weight: u32 = labels
                .get(&format!("{}{}.loadbalancer.server.weight", service_prefix, service_name))
                .and_then(|value| value.parse().ok())
                .unwrap_or(1);
            let strategy = labels
                .get(&format!("{}{}.loadbalancer.strategy", service_prefix, service_name))
                .map(|value| match value.as_str() {
                    "weighted" => LoadBalancerStrategy::Weighted,
                    _ => LoadBalancerStrategy::RoundRobin,
                })
                .unwrap_or_default();

            let instance_address: SocketAddr = format!("{}:{}", address, port)
                .parse()
                .map_err(|_| DiscoveryError::NetworkError {
                    container_id: container_id.to_string(),
                    network: self.settings.network.clone(),
                    reason: format!("유효하지 않은 주소 {}:{}", address, port),
                })?;

            let entry = services.entry(service_name.clone()).or_insert_with(|| {
                ServiceDefinition {
                    name: service_name.clone(),
                    strategy,
                    instances: Vec::new(),
                }
            });

            if !entry.instances.iter().any(|i| i.address == instance_address) {
                debug!(
                    service = %service_name,
                    address = %instance_address,
                    weight = weight,
                    "서비스 인스턴스 발견"
                );
                entry.instances.push(InstanceDefinition {
                    address: instance_address,
                    weight,
                });
            }
        }

        Ok(())
    }

    /// 설정된 네트워크에서 컨테이너의 IP 주소를 찾습니다.
    fn container_address(&self, container: &ContainerSummary) -> Result<String, DiscoveryError> {
        let container_id = container.id.as_deref().unwrap_or("unknown").to_string();

        let networks = container.network_settings.as_ref()
            .and_then(|s| s.networks.as_ref())
            .ok_or_else(|| DiscoveryError::NetworkError {
                container_id: container_id.clone(),
                network: self.settings.network.clone(),
                reason: "네트워크 정보 없음".to_string(),
            })?;

        let endpoint = networks.get(&self.settings.network)
            .ok_or_else(|| DiscoveryError::NetworkError {
                container_id: container_id.clone(),
                network: self.settings.network.clone(),
                reason: "지정된 네트워크에 연결되어 있지 않음".to_string(),
            })?;

        endpoint.ip_address.clone()
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| DiscoveryError::NetworkError {
                container_id,
                network: self.settings.network.clone(),
                reason: "IP 주소 없음".to_string(),
            })
    }

    /// 컨테이너 생명주기 이벤트를 구독하고 변경마다 재동기화합니다.
    async fn run_event_loop(self, tx: mpsc::Sender<DiscoveryEvent>) {
        // 초기 전체 동기화
        match self.sync().await {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, "초기 컨테이너 동기화 실패");
                if tx.send(DiscoveryEvent::Error(e)).await.is_err() {
                    return;
                }
            }
        }

        let options = Some(EventsOptions::<String> {
            filters: {
                let mut filters = HashMap::new();
                filters.insert("type".to_string(), vec!["container".to_string()]);
                filters.insert(
                    "event".to_string(),
                    vec![
                        "start".to_string(),
                        "stop".to_string(),
                        "die".to_string(),
                        "kill".to_string(),
                    ],
                );
                filters
            },
            ..Default::default()
        });

        let mut events = self.docker.events(options);

        while let Some(event) = events.next().await {
            match event {
                Ok(message) => {
                    if message.typ != Some(EventMessageTypeEnum::CONTAINER) {
                        continue;
                    }
                    debug!(action = ?message.action, "컨테이너 이벤트 수신, 재동기화");

                    match self.sync().await {
                        Ok(synced) => {
                            if tx.send(synced).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "컨테이너 재동기화 실패");
                            if tx.send(DiscoveryEvent::Error(e)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "이벤트 스트림 오류");
                    let _ = tx.send(DiscoveryEvent::Error(
                        DiscoveryError::EventStreamError(e.to_string()),
                    )).await;
                    return;
                }
            }
        }

        warn!("Docker 이벤트 스트림 종료");
    }
}

#[async_trait]
impl ServiceDiscovery for DockerDiscovery {
    async fn subscribe(&self) -> mpsc::Receiver<DiscoveryEvent> {
        let (tx, rx) = mpsc::channel(16);
        let discovery = self.clone();
        tokio::spawn(discovery.run_event_loop(tx));
        rx
    }
}

struct SyncOperation<'a> {
    discovery: &'a DockerDiscovery,
}

#[async_trait]
impl<'a> RetryableOperation for SyncOperation<'a> {
    type Output = DiscoveryEvent;

    async fn execute(&self) -> Result<Self::Output, DiscoveryError> {
        self.discovery.try_sync().await
    }
}
