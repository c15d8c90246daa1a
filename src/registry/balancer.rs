use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use serde::{Deserialize, Serialize};

use crate::registry::instance::Instance;

/// 로드 밸런싱 전략입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerStrategy {
    #[default]
    RoundRobin,
    Weighted,
}

/// 정상 인스턴스 중 하나를 선택합니다.
///
/// `exclude` 목록의 주소는 후보에서 제외됩니다 (재시도 시 이미
/// 실패한 인스턴스를 건너뛰기 위함).
pub fn select<'a>(
    strategy: LoadBalancerStrategy,
    instances: &'a [Arc<Instance>],
    cursor: &AtomicUsize,
    exclude: &[SocketAddr],
) -> Option<&'a Arc<Instance>> {
    let candidates: Vec<&Arc<Instance>> = instances.iter()
        .filter(|i| i.is_healthy() && !exclude.contains(&i.address))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    match strategy {
        LoadBalancerStrategy::RoundRobin => {
            let index = cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
            Some(candidates[index])
        }
        LoadBalancerStrategy::Weighted => {
            let total: u64 = candidates.iter().map(|i| i.weight as u64).sum();
            let mut slot = (cursor.fetch_add(1, Ordering::Relaxed) as u64) % total;
            for instance in &candidates {
                let weight = instance.weight as u64;
                if slot < weight {
                    return Some(instance);
                }
                slot -= weight;
            }
            // 누적 가중치 순회는 항상 total 이전에 끝난다
            candidates.last().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances(specs: &[(&str, u32)]) -> Vec<Arc<Instance>> {
        specs.iter()
            .map(|(addr, weight)| Arc::new(Instance::new(addr.parse().unwrap(), *weight)))
            .collect()
    }

    #[test]
    fn test_round_robin_rotates() {
        let backends = instances(&[("127.0.0.1:8080", 1), ("127.0.0.1:8081", 1)]);
        let cursor = AtomicUsize::new(0);

        let first = select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &[]).unwrap();
        let second = select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &[]).unwrap();
        let third = select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &[]).unwrap();

        assert_eq!(first.address, backends[0].address);
        assert_eq!(second.address, backends[1].address);
        assert_eq!(third.address, backends[0].address);
    }

    #[test]
    fn test_unhealthy_instances_skipped() {
        let backends = instances(&[("127.0.0.1:8080", 1), ("127.0.0.1:8081", 1)]);
        backends[0].set_healthy(false);
        let cursor = AtomicUsize::new(0);

        for _ in 0..5 {
            let selected = select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &[]).unwrap();
            assert_eq!(selected.address, backends[1].address);
        }
    }

    #[test]
    fn test_all_unhealthy_returns_none() {
        let backends = instances(&[("127.0.0.1:8080", 1)]);
        backends[0].set_healthy(false);
        let cursor = AtomicUsize::new(0);

        assert!(select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &[]).is_none());
    }

    #[test]
    fn test_weighted_distribution_is_proportional() {
        let backends = instances(&[("127.0.0.1:8080", 3), ("127.0.0.1:8081", 1)]);
        let cursor = AtomicUsize::new(0);

        let mut counts = [0usize; 2];
        for _ in 0..1000 {
            let selected = select(LoadBalancerStrategy::Weighted, &backends, &cursor, &[]).unwrap();
            if selected.address == backends[0].address {
                counts[0] += 1;
            } else {
                counts[1] += 1;
            }
        }

        assert!((700..=800).contains(&counts[0]), "가중치 3:1 분배 실패: {:?}", counts);
    }

    #[test]
    fn test_exclusion_for_retry() {
        let backends = instances(&[("127.0.0.1:8080", 1), ("127.0.0.1:8081", 1)]);
        let cursor = AtomicUsize::new(0);
        let exclude = vec![backends[0].address];

        let selected = select(LoadBalancerStrategy::RoundRobin, &backends, &cursor, &exclude).unwrap();
        assert_eq!(selected.address, backends[1].address);
    }
}
