use std::hash::Hash;
use regex_lite as regex;
use crate::matcher::error::RuleError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathMatcherKind {
    Exact,
    Prefix,
    Regex,
}

/// 경로 매칭 조건입니다.
///
/// `Path`는 정확히 일치, `PathPrefix`는 세그먼트 경계를 존중하는
/// 접두사 일치, `PathRegexp`는 정규식 일치로 컴파일됩니다.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pub kind: PathMatcherKind,
    pub pattern: String,
    regex: Option<regex::Regex>,
}

impl PathMatcher {
    /// 정확히 일치하는 경로 매처를 생성합니다.
    pub fn exact(pattern: &str) -> Result<Self, RuleError> {
        Self::validate_path(pattern)?;
        Ok(PathMatcher {
            kind: PathMatcherKind::Exact,
            pattern: pattern.to_string(),
            regex: None,
        })
    }

    /// 접두사 매처를 생성합니다.
    pub fn prefix(pattern: &str) -> Result<Self, RuleError> {
        Self::validate_path(pattern)?;
        Ok(PathMatcher {
            kind: PathMatcherKind::Prefix,
            pattern: pattern.trim_end_matches('*').to_string(),
            regex: None,
        })
    }

    /// 정규식 매처를 생성합니다.
    pub fn regexp(pattern: &str) -> Result<Self, RuleError> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(PathMatcher {
            kind: PathMatcherKind::Regex,
            pattern: pattern.to_string(),
            regex: Some(re),
        })
    }

    fn validate_path(pattern: &str) -> Result<(), RuleError> {
        if !pattern.starts_with('/') {
            return Err(RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "경로는 '/'로 시작해야 함".to_string(),
            });
        }
        Ok(())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            PathMatcherKind::Exact => self.pattern == path,
            PathMatcherKind::Prefix => {
                if self.pattern == "/" {
                    return true;
                }
                // 접두사 매칭에서는 trailing slash 무시
                let pattern = self.pattern.trim_end_matches('/');
                let path = path.trim_end_matches('/');
                path == pattern || path.starts_with(&format!("{}/", pattern))
            }
            PathMatcherKind::Regex => self.regex.as_ref()
                .map(|r| r.is_match(path))
                .unwrap_or(false),
        }
    }

    /// 컴파일 시점에 계산되는 구체성 점수입니다.
    ///
    /// 정확한 경로가 접두사보다 높고, 긴 접두사가 짧은 접두사보다 높습니다.
    pub fn specificity(&self) -> i32 {
        match self.kind {
            PathMatcherKind::Exact => 200 + self.pattern.len() as i32,
            PathMatcherKind::Prefix => self.pattern.trim_end_matches('/').len() as i32,
            PathMatcherKind::Regex => 10,
        }
    }
}

impl PartialEq for PathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}

impl Eq for PathMatcher {}

impl Hash for PathMatcher {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.pattern.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matches_segment_boundary() {
        let matcher = PathMatcher::prefix("/api").unwrap();

        assert!(matcher.matches("/api"));
        assert!(matcher.matches("/api/"));
        assert!(matcher.matches("/api/users"));
        assert!(!matcher.matches("/apis"));
        assert!(!matcher.matches("/api-v2"));
    }

    #[test]
    fn test_exact_does_not_match_children() {
        let matcher = PathMatcher::exact("/api").unwrap();

        assert!(matcher.matches("/api"));
        assert!(!matcher.matches("/api/users"));
        assert!(!matcher.matches("/api/"));
    }

    #[test]
    fn test_longer_prefix_is_more_specific() {
        let short = PathMatcher::prefix("/api").unwrap();
        let long = PathMatcher::prefix("/api/v1/users").unwrap();

        assert!(long.specificity() > short.specificity());
    }

    #[test]
    fn test_invalid_path_rejected() {
        assert!(PathMatcher::exact("api").is_err());
        assert!(PathMatcher::prefix("api/*").is_err());
        assert!(PathMatcher::regexp("^[invalid").is_err());
    }
}
