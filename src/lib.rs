//! edge_gateway는 동적 라우팅 테이블을 가진 경량 리버스 프록시 엔진입니다.
//!
//! # 주요 기능
//!
//! - 규칙 기반 라우팅 (`Host(`app.example.com`) && PathPrefix(`/api`)`)
//! - 원자적으로 교체되는 불변 라우팅 테이블 스냅샷
//! - 디스커버리 이벤트로 갱신되는 서비스 레지스트리와 로드 밸런싱
//! - 미들웨어 체인 (인증, 헤더, 요청 한도, 접두사 제거, CORS)
//! - 연결 실패 재시도와 서킷 브레이킹을 갖춘 전달기
//!
//! # 라우팅 테이블 구성
//!
//! ```
//! use std::collections::HashSet;
//! use edge_gateway::router::{RouteDefinition, RouterTable};
//!
//! let routes = vec![RouteDefinition {
//!     id: "api".to_string(),
//!     rule: "Host(`api.example.com`) && PathPrefix(`/v1`)".to_string(),
//!     service: "api-backend".to_string(),
//!     middlewares: vec![],
//!     priority: None,
//! }];
//!
//! let services: HashSet<String> = ["api-backend".to_string()].into_iter().collect();
//! let table = RouterTable::build(1, &routes, &services, &HashSet::new()).unwrap();
//! assert_eq!(table.routes().len(), 1);
//! ```
//!
//! # 서비스 레지스트리
//!
//! ```
//! use edge_gateway::registry::{Instance, ServiceRegistry};
//!
//! let registry = ServiceRegistry::new();
//! registry.register("web", Instance::new("127.0.0.1:8080".parse().unwrap(), 1)).unwrap();
//! registry.register("web", Instance::new("127.0.0.1:8081".parse().unwrap(), 1)).unwrap();
//!
//! // 정상 인스턴스 중 하나가 선택됨
//! assert!(registry.select("web").is_ok());
//! ```

pub mod discovery;
pub mod logging;
pub mod matcher;
pub mod middleware;
pub mod proxy;
pub mod registry;
pub mod router;
pub mod server;
pub mod settings;
pub mod tls;
