use std::hash::Hash;
use crate::matcher::error::RuleError;

/// 호스트 매칭 패턴입니다.
///
/// 정확한 호스트 이름(`app.example.com`)과 와일드카드
/// (`*.example.com`, 한 단계 레이블만 대체)를 지원합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostPattern {
    Exact(String),
    Wildcard(String),
}

impl HostPattern {
    pub fn parse(pattern: &str) -> Result<Self, RuleError> {
        let pattern = pattern.trim().to_lowercase();

        if pattern.is_empty() {
            return Err(RuleError::InvalidPattern {
                pattern,
                reason: "호스트 패턴이 비어있음".to_string(),
            });
        }

        if let Some(suffix) = pattern.strip_prefix("*.") {
            if suffix.is_empty() || suffix.contains('*') {
                return Err(RuleError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: "와일드카드는 '*.도메인' 형식이어야 함".to_string(),
                });
            }
            return Ok(HostPattern::Wildcard(suffix.to_string()));
        }

        if pattern.contains('*') {
            return Err(RuleError::InvalidPattern {
                pattern: pattern.clone(),
                reason: "와일드카드는 맨 앞 레이블에만 올 수 있음".to_string(),
            });
        }

        Ok(HostPattern::Exact(pattern))
    }

    /// 호스트 이름과 매칭합니다. 호스트 비교는 대소문자를 구분하지 않습니다.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        match self {
            HostPattern::Exact(expected) => &host == expected,
            HostPattern::Wildcard(suffix) => {
                // 한 단계 레이블만 대체: foo.example.com은 매칭, a.b.example.com은 비매칭
                match host.split_once('.') {
                    Some((label, rest)) => !label.is_empty() && rest == suffix,
                    None => false,
                }
            }
        }
    }

    /// 정확한 호스트가 패턴 호스트보다 구체적입니다.
    pub fn specificity(&self) -> i32 {
        match self {
            HostPattern::Exact(_) => 100,
            HostPattern::Wildcard(_) => 50,
        }
    }
}
