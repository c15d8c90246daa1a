//! 라우팅 규칙을 컴파일하고 평가하는 모듈입니다.

mod error;
mod host;
mod path;
mod rule;

pub use error::RuleError;
pub use host::HostPattern;
pub use path::{PathMatcher, PathMatcherKind};
pub use rule::{Predicate, RequestInfo, RouterRule};
