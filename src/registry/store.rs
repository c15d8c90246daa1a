use std::net::SocketAddr;
use std::sync::Arc;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::registry::error::RegistryError;
use crate::registry::instance::Instance;
use crate::registry::service::{Service, ServiceDefinition};

/// 서비스 레지스트리입니다.
///
/// 디스커버리 이벤트와 설정 리로드가 레지스트리를 변경하고, 요청
/// 처리 경로는 `select`로 읽기만 합니다. 서비스 단위로 샤딩된 맵을
/// 사용하므로 읽기와 쓰기가 서로를 장시간 차단하지 않습니다.
pub struct ServiceRegistry {
    services: DashMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// 서비스 정의 목록으로 레지스트리를 통째로 동기화합니다.
    ///
    /// 기존 인스턴스의 상태 플래그(정상/비정상, 실패 카운터)는 주소가
    /// 같으면 그대로 유지됩니다. 정의에 없는 서비스는 제거됩니다.
    pub fn apply_definitions(&self, definitions: &[ServiceDefinition]) {
        let names: Vec<String> = definitions.iter().map(|d| d.name.clone()).collect();
        self.services.retain(|name, _| names.contains(name));

        for definition in definitions {
            let mut service = Service::new(&definition.name, definition.strategy);

            for instance_def in &definition.instances {
                let instance = Instance::new(instance_def.address, instance_def.weight);

                // 기존 상태 유지: 같은 주소의 인스턴스가 있었다면 상태를 넘겨받음
                if let Some(existing) = self.services.get(&definition.name) {
                    if let Some(previous) = existing.find_instance(instance_def.address) {
                        instance.set_healthy(previous.is_healthy());
                    }
                }

                if let Err(e) = service.add_instance(instance) {
                    warn!(error = %e, service = %definition.name, "중복 인스턴스 정의 무시");
                }
            }

            self.services.insert(definition.name.clone(), service);
        }

        info!(service_count = definitions.len(), "서비스 레지스트리 동기화 완료");
    }

    /// 서비스에 인스턴스를 등록합니다. 서비스가 없으면 생성합니다.
    pub fn register(&self, service_name: &str, instance: Instance) -> Result<(), RegistryError> {
        let mut entry = self.services.entry(service_name.to_string())
            .or_insert_with(|| Service::new(service_name, Default::default()));
        debug!(service = %service_name, address = %instance.address, "인스턴스 등록");
        entry.add_instance(instance)
    }

    /// 인스턴스를 제거합니다. 서비스의 마지막 인스턴스여도 서비스는 남겨둡니다.
    pub fn deregister(&self, service_name: &str, address: SocketAddr) -> Result<(), RegistryError> {
        let mut entry = self.services.get_mut(service_name)
            .ok_or_else(|| RegistryError::UnknownService {
                service: service_name.to_string(),
            })?;
        if entry.remove_instance(address) {
            debug!(service = %service_name, address = %address, "인스턴스 제거");
        }
        Ok(())
    }

    /// 인스턴스의 상태를 변경합니다. 이후의 `select`에 즉시 반영됩니다.
    pub fn mark_health(&self, service_name: &str, address: SocketAddr, healthy: bool) {
        if let Some(service) = self.services.get(service_name) {
            if let Some(instance) = service.find_instance(address) {
                if instance.is_healthy() != healthy {
                    info!(
                        service = %service_name,
                        address = %address,
                        healthy = healthy,
                        "인스턴스 상태 변경"
                    );
                }
                instance.set_healthy(healthy);
            }
        }
    }

    /// 정상 상태의 인스턴스 하나를 선택합니다.
    pub fn select(&self, service_name: &str) -> Result<Arc<Instance>, RegistryError> {
        self.select_excluding(service_name, &[])
    }

    /// `exclude`에 포함된 주소를 제외하고 인스턴스를 선택합니다.
    pub fn select_excluding(
        &self,
        service_name: &str,
        exclude: &[SocketAddr],
    ) -> Result<Arc<Instance>, RegistryError> {
        let service = self.services.get(service_name)
            .ok_or_else(|| RegistryError::UnknownService {
                service: service_name.to_string(),
            })?;
        service.select(exclude)
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.services.contains_key(service_name)
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// 관리용 조회를 위한 서비스 상태 스냅샷입니다.
    pub fn snapshot(&self) -> Vec<Service> {
        self.services.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
