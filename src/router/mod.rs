//! 검증된 라우팅 테이블 스냅샷과 원자적 교체를 제공하는 모듈입니다.

mod error;
mod host;
mod route;
mod shared;
mod table;

pub use error::{RouteValidationError, RouterError, ValidationErrorKind, ValidationErrors};
pub use host::HostInfo;
pub use route::{Route, RouteDefinition};
pub use shared::SharedRouterTable;
pub use table::RouterTable;
