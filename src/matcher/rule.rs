use hyper::HeaderMap;
use regex_lite as regex;

use crate::matcher::error::RuleError;
use crate::matcher::host::HostPattern;
use crate::matcher::path::PathMatcher;

/// 규칙 평가에 필요한 요청 속성입니다.
///
/// 평가는 순수 함수이므로 동일한 속성에 대해 항상 동일한 결과를 반환합니다.
#[derive(Debug)]
pub struct RequestInfo<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub method: &'a str,
    pub headers: &'a HeaderMap,
}

/// 단일 조건 함수입니다.
#[derive(Debug, Clone)]
pub enum Predicate {
    Host(HostPattern),
    HostRegexp {
        pattern: String,
        regex: regex::Regex,
    },
    Path(PathMatcher),
    PathPrefix(PathMatcher),
    PathRegexp(PathMatcher),
    Method(String),
    Header {
        name: String,
        value: String,
    },
}

impl Predicate {
    fn evaluate(&self, info: &RequestInfo<'_>) -> bool {
        match self {
            Predicate::Host(pattern) => pattern.matches(info.host),
            Predicate::HostRegexp { regex, .. } => regex.is_match(&info.host.to_lowercase()),
            Predicate::Path(matcher)
            | Predicate::PathPrefix(matcher)
            | Predicate::PathRegexp(matcher) => matcher.matches(info.path),
            Predicate::Method(method) => info.method.eq_ignore_ascii_case(method),
            Predicate::Header { name, value } => info.headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == value)
                .unwrap_or(false),
        }
    }

    fn specificity(&self) -> i32 {
        match self {
            Predicate::Host(pattern) => pattern.specificity(),
            Predicate::HostRegexp { .. } => 30,
            Predicate::Path(matcher)
            | Predicate::PathPrefix(matcher)
            | Predicate::PathRegexp(matcher) => matcher.specificity(),
            Predicate::Method(_) => 1,
            Predicate::Header { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
enum RuleNode {
    Predicate(Predicate),
    And(Box<RuleNode>, Box<RuleNode>),
    Or(Box<RuleNode>, Box<RuleNode>),
}

impl RuleNode {
    fn evaluate(&self, info: &RequestInfo<'_>) -> bool {
        match self {
            RuleNode::Predicate(p) => p.evaluate(info),
            RuleNode::And(left, right) => left.evaluate(info) && right.evaluate(info),
            RuleNode::Or(left, right) => left.evaluate(info) || right.evaluate(info),
        }
    }

    /// AND는 조건 점수를 합산하고, OR은 가장 약한 분기를 따릅니다.
    fn specificity(&self) -> i32 {
        match self {
            RuleNode::Predicate(p) => p.specificity(),
            RuleNode::And(left, right) => left.specificity() + right.specificity(),
            RuleNode::Or(left, right) => left.specificity().min(right.specificity()),
        }
    }
}

/// 컴파일된 라우팅 규칙입니다.
///
/// `Host(`app.example.com`) && PathPrefix(`/api`)` 형태의 표현식을
/// 요청 속성에 대한 조건식으로 컴파일합니다. 구체성 점수는 컴파일
/// 시점에 한 번 계산됩니다.
#[derive(Debug, Clone)]
pub struct RouterRule {
    expression: String,
    node: RuleNode,
    specificity: i32,
}

impl RouterRule {
    pub fn parse(expression: &str) -> Result<Self, RuleError> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(RuleError::EmptyRule);
        }

        let mut parser = Parser { tokens, position: 0 };
        let node = parser.parse_expression()?;

        if parser.position != parser.tokens.len() {
            let (token, position) = parser.current_description();
            return Err(RuleError::UnexpectedToken { token, position });
        }

        let specificity = node.specificity();
        Ok(RouterRule {
            expression: expression.to_string(),
            node,
            specificity,
        })
    }

    pub fn evaluate(&self, info: &RequestInfo<'_>) -> bool {
        self.node.evaluate(info)
    }

    pub fn specificity(&self) -> i32 {
        self.specificity
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl PartialEq for RouterRule {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Eq for RouterRule {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Arg(String),
    LParen,
    RParen,
    Comma,
    And,
    Or,
}

fn tokenize(expression: &str) -> Result<Vec<(Token, usize)>, RuleError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, i));
                i += 1;
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push((Token::And, i));
                    i += 2;
                } else {
                    return Err(RuleError::UnexpectedToken {
                        token: "&".to_string(),
                        position: i,
                    });
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push((Token::Or, i));
                    i += 2;
                } else {
                    return Err(RuleError::UnexpectedToken {
                        token: "|".to_string(),
                        position: i,
                    });
                }
            }
            '`' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '`' {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(RuleError::UnbalancedExpression {
                        expression: expression.to_string(),
                        reason: "닫히지 않은 백틱 문자열".to_string(),
                    });
                }
                tokens.push((Token::Arg(chars[start..end].iter().collect()), i));
                i = end + 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
            }
            _ => {
                return Err(RuleError::UnexpectedToken {
                    token: c.to_string(),
                    position: i,
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    // expr := term ('||' term)*
    fn parse_expression(&mut self) -> Result<RuleNode, RuleError> {
        let mut node = self.parse_term()?;
        while self.consume_if(&Token::Or) {
            let right = self.parse_term()?;
            node = RuleNode::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    // term := factor ('&&' factor)*
    fn parse_term(&mut self) -> Result<RuleNode, RuleError> {
        let mut node = self.parse_factor()?;
        while self.consume_if(&Token::And) {
            let right = self.parse_factor()?;
            node = RuleNode::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    // factor := '(' expr ')' | ident '(' args ')'
    fn parse_factor(&mut self) -> Result<RuleNode, RuleError> {
        if self.consume_if(&Token::LParen) {
            let node = self.parse_expression()?;
            self.expect(&Token::RParen, "닫는 괄호 누락")?;
            return Ok(node);
        }

        let name = match self.next() {
            Some((Token::Ident(name), _)) => name,
            Some((token, position)) => {
                return Err(RuleError::UnexpectedToken {
                    token: describe(&token),
                    position,
                });
            }
            None => {
                return Err(RuleError::UnbalancedExpression {
                    expression: self.expression_snippet(),
                    reason: "조건 함수가 와야 할 자리에서 표현식이 끝남".to_string(),
                });
            }
        };

        self.expect(&Token::LParen, "조건 함수 뒤에 '('가 와야 함")?;
        let args = self.parse_args()?;
        self.expect(&Token::RParen, "조건 함수의 닫는 괄호 누락")?;

        let predicate = build_predicate(&name, &args)?;
        Ok(RuleNode::Predicate(predicate))
    }

    fn parse_args(&mut self) -> Result<Vec<String>, RuleError> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Arg(_)) => {
                    if let Some((Token::Arg(value), _)) = self.next() {
                        args.push(value);
                    }
                }
                _ => break,
            }
            if !self.consume_if(&Token::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn consume_if(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, reason: &str) -> Result<(), RuleError> {
        if self.consume_if(expected) {
            Ok(())
        } else {
            Err(RuleError::UnbalancedExpression {
                expression: self.expression_snippet(),
                reason: reason.to_string(),
            })
        }
    }

    fn current_description(&self) -> (String, usize) {
        match self.tokens.get(self.position) {
            Some((token, position)) => (describe(token), *position),
            None => ("<end>".to_string(), 0),
        }
    }

    fn expression_snippet(&self) -> String {
        self.tokens.iter()
            .map(|(t, _)| describe(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => name.clone(),
        Token::Arg(value) => format!("`{}`", value),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Comma => ",".to_string(),
        Token::And => "&&".to_string(),
        Token::Or => "||".to_string(),
    }
}

fn build_predicate(name: &str, args: &[String]) -> Result<Predicate, RuleError> {
    let single_arg = |predicate: &str| -> Result<&String, RuleError> {
        match args {
            [value] => Ok(value),
            _ => Err(RuleError::InvalidArgument {
                predicate: predicate.to_string(),
                reason: format!("인자 1개가 필요한데 {}개가 주어짐", args.len()),
            }),
        }
    };

    match name {
        "Host" => Ok(Predicate::Host(HostPattern::parse(single_arg("Host")?)?)),
        "HostRegexp" => {
            let pattern = single_arg("HostRegexp")?;
            let regex = regex::Regex::new(pattern)
                .map_err(|e| RuleError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            Ok(Predicate::HostRegexp {
                pattern: pattern.clone(),
                regex,
            })
        }
        "Path" => Ok(Predicate::Path(PathMatcher::exact(single_arg("Path")?)?)),
        "PathPrefix" => Ok(Predicate::PathPrefix(PathMatcher::prefix(single_arg("PathPrefix")?)?)),
        "PathRegexp" => Ok(Predicate::PathRegexp(PathMatcher::regexp(single_arg("PathRegexp")?)?)),
        "Method" => {
            let method = single_arg("Method")?;
            if method.is_empty() {
                return Err(RuleError::InvalidArgument {
                    predicate: "Method".to_string(),
                    reason: "메서드 이름이 비어있음".to_string(),
                });
            }
            Ok(Predicate::Method(method.to_uppercase()))
        }
        "Header" => match args {
            [name, value] => Ok(Predicate::Header {
                name: name.to_lowercase(),
                value: value.clone(),
            }),
            _ => Err(RuleError::InvalidArgument {
                predicate: "Header".to_string(),
                reason: format!("인자 2개가 필요한데 {}개가 주어짐", args.len()),
            }),
        },
        _ => Err(RuleError::UnknownPredicate {
            name: name.to_string(),
        }),
    }
}
