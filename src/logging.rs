//! tracing 초기화와 요청 생명주기 로깅을 제공하는 모듈입니다.

use std::path::Path;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::settings::logging::{LogFormat, LogOutput};
use crate::settings::LogSettings;

/// 로그 설정에 따라 전역 구독자를 초기화합니다.
pub fn init_logging(settings: &LogSettings) {
    let filter = EnvFilter::from_default_env()
        .add_directive(settings.level.into())
        .add_directive("edge_gateway=debug".parse().expect("고정 디렉티브"));

    match (&settings.format, &settings.output) {
        (LogFormat::Text, LogOutput::Stdout) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        (LogFormat::Json, LogOutput::Stdout) => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        (format, LogOutput::File(path)) => {
            let path = Path::new(path);
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "gateway.log".to_string());
            let appender = tracing_appender::rolling::never(directory, file_name);

            match format {
                LogFormat::Json => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_env_filter(filter)
                        .with_writer(appender)
                        .with_ansi(false)
                        .init();
                }
                LogFormat::Text => {
                    tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_writer(appender)
                        .with_ansi(false)
                        .init();
                }
            }
        }
    }
}

/// 요청 하나의 처리 기록입니다.
#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub route_id: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    pub backend_address: Option<String>,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            host: String::new(),
            route_id: None,
            status_code: 0,
            duration_ms: 0,
            backend_address: None,
            error: None,
        }
    }

    pub fn with_request<B>(&mut self, req: &hyper::Request<B>) {
        self.method = req.method().to_string();
        self.path = req.uri().path().to_string();
        if let Some(host) = req.headers().get(hyper::header::HOST) {
            self.host = host.to_str().unwrap_or_default().to_string();
        }
    }

    pub fn with_route(&mut self, route_id: &str) {
        self.route_id = Some(route_id.to_string());
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    /// 처리 결과를 심각도에 맞는 레벨로 기록합니다.
    pub fn emit(&self) {
        let level = if self.error.is_some() {
            Level::ERROR
        } else if self.status_code >= 500 {
            Level::WARN
        } else {
            Level::INFO
        };

        match level {
            Level::ERROR => error!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                host = %self.host,
                route = ?self.route_id,
                status = self.status_code,
                duration_ms = self.duration_ms,
                backend = ?self.backend_address,
                error = ?self.error,
                "요청 처리 실패"
            ),
            Level::WARN => warn!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                host = %self.host,
                route = ?self.route_id,
                status = self.status_code,
                duration_ms = self.duration_ms,
                backend = ?self.backend_address,
                "요청이 에러 상태로 완료됨"
            ),
            _ => info!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                host = %self.host,
                route = ?self.route_id,
                status = self.status_code,
                duration_ms = self.duration_ms,
                backend = ?self.backend_address,
                "요청 처리 완료"
            ),
        }
    }
}
