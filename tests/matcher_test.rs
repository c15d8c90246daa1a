use edge_gateway::matcher::{HostPattern, PathMatcher, PathMatcherKind, RequestInfo, RouterRule};
use hyper::HeaderMap;

fn request_info<'a>(
    host: &'a str,
    path: &'a str,
    method: &'a str,
    headers: &'a HeaderMap,
) -> RequestInfo<'a> {
    RequestInfo {
        host,
        path,
        method,
        headers,
    }
}

#[test]
fn test_rule_compilation() {
    let test_cases = vec![
        // (표현식, 성공 여부)
        ("Host(`app.example.com`)", true),
        ("Host(`app.example.com`) && PathPrefix(`/api`)", true),
        ("Host(`a.com`) || Host(`b.com`)", true),
        ("(Host(`a.com`) || Host(`b.com`)) && Method(`GET`)", true),
        ("Header(`X-Env`, `prod`)", true),
        ("PathRegexp(`^/api/v[0-9]+`)", true),
        ("", false),
        ("Host(`a.com`) &&", false),
        ("Host(`a.com`) & Host(`b.com`)", false),
        ("Unknown(`x`)", false),
        ("Host(`a.com`", false),
        ("(Host(`a.com`)", false),
        ("Host(`a.com`, `b.com`)", false),
    ];

    for (expression, should_succeed) in test_cases {
        let result = RouterRule::parse(expression);
        assert_eq!(
            result.is_ok(),
            should_succeed,
            "표현식 '{}': 예상 {}, 실제 {:?}",
            expression,
            should_succeed,
            result.err()
        );
    }
}

#[test]
fn test_rule_evaluation() {
    let headers = HeaderMap::new();
    let test_cases = vec![
        // (표현식, 호스트, 경로, 메서드, 예상 결과)
        ("Host(`app.example.com`)", "app.example.com", "/", "GET", true),
        ("Host(`app.example.com`)", "other.example.com", "/", "GET", false),
        ("Host(`*.example.com`)", "app.example.com", "/", "GET", true),
        ("Host(`*.example.com`)", "example.com", "/", "GET", false),
        ("PathPrefix(`/api`)", "any.com", "/api/users", "GET", true),
        ("PathPrefix(`/api`)", "any.com", "/apis", "GET", false),
        ("Path(`/health`)", "any.com", "/health", "GET", true),
        ("Path(`/health`)", "any.com", "/health/live", "GET", false),
        ("Method(`POST`)", "any.com", "/", "POST", true),
        ("Method(`POST`)", "any.com", "/", "GET", false),
        (
            "Host(`app.example.com`) && PathPrefix(`/api`)",
            "app.example.com",
            "/api/v1",
            "GET",
            true,
        ),
        (
            "Host(`app.example.com`) && PathPrefix(`/api`)",
            "app.example.com",
            "/static",
            "GET",
            false,
        ),
        (
            "Host(`a.com`) || Host(`b.com`)",
            "b.com",
            "/",
            "GET",
            true,
        ),
    ];

    for (expression, host, path, method, expected) in test_cases {
        let rule = RouterRule::parse(expression)
            .unwrap_or_else(|e| panic!("'{}' 컴파일 실패: {}", expression, e));

        assert_eq!(
            rule.evaluate(&request_info(host, path, method, &headers)),
            expected,
            "표현식 '{}', 호스트 '{}', 경로 '{}'",
            expression,
            host,
            path
        );
    }
}

#[test]
fn test_header_predicate() {
    let mut headers = HeaderMap::new();
    headers.insert("x-env", "prod".parse().unwrap());

    let rule = RouterRule::parse("Header(`X-Env`, `prod`)").unwrap();
    assert!(rule.evaluate(&request_info("any.com", "/", "GET", &headers)));

    let rule = RouterRule::parse("Header(`X-Env`, `staging`)").unwrap();
    assert!(!rule.evaluate(&request_info("any.com", "/", "GET", &headers)));

    let empty = HeaderMap::new();
    let rule = RouterRule::parse("Header(`X-Env`, `prod`)").unwrap();
    assert!(!rule.evaluate(&request_info("any.com", "/", "GET", &empty)));
}

#[test]
fn test_specificity_ordering() {
    // 호스트 정확 > 호스트 와일드카드
    let exact = RouterRule::parse("Host(`app.example.com`)").unwrap();
    let wildcard = RouterRule::parse("Host(`*.example.com`)").unwrap();
    assert!(exact.specificity() > wildcard.specificity());

    // 긴 경로 접두사 > 짧은 경로 접두사
    let long = RouterRule::parse("PathPrefix(`/api/v1/users`)").unwrap();
    let short = RouterRule::parse("PathPrefix(`/api`)").unwrap();
    assert!(long.specificity() > short.specificity());

    // AND는 합산되므로 조건이 많을수록 구체적
    let combined = RouterRule::parse("Host(`app.example.com`) && PathPrefix(`/api`)").unwrap();
    let host_only = RouterRule::parse("Host(`app.example.com`)").unwrap();
    assert!(combined.specificity() > host_only.specificity());

    // OR은 가장 약한 분기를 따름
    let or_rule = RouterRule::parse("Host(`app.example.com`) || PathPrefix(`/`)").unwrap();
    let prefix_root = RouterRule::parse("PathPrefix(`/`)").unwrap();
    assert_eq!(or_rule.specificity(), prefix_root.specificity());
}

#[test]
fn test_path_matcher_kinds() {
    let exact = PathMatcher::exact("/api").unwrap();
    assert_eq!(exact.kind, PathMatcherKind::Exact);

    let prefix = PathMatcher::prefix("/api").unwrap();
    assert_eq!(prefix.kind, PathMatcherKind::Prefix);

    let regex = PathMatcher::regexp("^/api/.*").unwrap();
    assert_eq!(regex.kind, PathMatcherKind::Regex);
}

#[test]
fn test_host_pattern_case_insensitive() {
    let pattern = HostPattern::parse("App.Example.COM").unwrap();
    assert!(pattern.matches("app.example.com"));
    assert!(pattern.matches("APP.EXAMPLE.COM"));
}

#[test]
fn test_evaluation_is_pure() {
    let headers = HeaderMap::new();
    let rule = RouterRule::parse(
        "(Host(`a.example.com`) || Host(`b.example.com`)) && PathPrefix(`/api`)"
    ).unwrap();
    let info = request_info("a.example.com", "/api/x", "GET", &headers);

    let results: Vec<bool> = (0..100).map(|_| rule.evaluate(&info)).collect();
    assert!(results.iter().all(|&r| r), "동일 입력에 대해 결과가 달라짐");
}
