use std::net::SocketAddr;
use std::time::Duration;
use http_body_util::BodyExt;
use hyper::client::conn::http1;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::middleware::{Request, Response};
use crate::registry::ServiceRegistry;
use super::error::ProxyError;

/// 전달 단계의 타임아웃과 재시도 한도입니다.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    /// 연결 실패 시 다른 인스턴스로 재시도하는 최대 횟수
    pub max_retries: u32,
    /// 이 횟수만큼 연속 실패한 인스턴스는 비정상으로 전환됨
    pub max_instance_failures: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            response_timeout: Duration::from_secs(30),
            max_retries: 2,
            max_instance_failures: 3,
        }
    }
}

/// 레지스트리에서 선택한 인스턴스로 요청을 전달합니다.
///
/// 연결에 실패하면 실패를 인스턴스에 기록하고 아직 시도하지 않은 다른
/// 인스턴스로 재시도합니다. 연결이 이루어져 요청이 전송된 뒤에는
/// 재시도하지 않습니다. 본문은 양방향 모두 스트리밍됩니다.
#[instrument(skip(config, registry, req), fields(service = %service))]
pub async fn forward(
    config: &ProxyConfig,
    registry: &ServiceRegistry,
    service: &str,
    req: Request,
) -> Result<Response, ProxyError> {
    let mut tried: Vec<SocketAddr> = Vec::new();
    let mut last_error: Option<ProxyError> = None;

    for attempt in 0..=config.max_retries {
        let instance = match registry.select_excluding(service, &tried) {
            Ok(instance) => instance,
            // 남은 후보가 없으면 마지막 연결 에러(있다면)를 보고
            Err(e) => return Err(last_error.unwrap_or(ProxyError::Registry(e))),
        };
        let address = instance.address;

        let stream = match timeout(config.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                record_connect_failure(config, service, &instance, &e.to_string());
                tried.push(address);
                last_error = Some(ProxyError::Connect {
                    address,
                    message: e.to_string(),
                });
                debug!(attempt = attempt, address = %address, "연결 실패, 재시도");
                continue;
            }
            Err(_) => {
                record_connect_failure(config, service, &instance, "연결 시간 초과");
                tried.push(address);
                last_error = Some(ProxyError::Connect {
                    address,
                    message: "연결 시간 초과".to_string(),
                });
                continue;
            }
        };

        instance.record_success();
        return send_request(config, address, stream, req).await;
    }

    Err(last_error.unwrap_or(ProxyError::Registry(
        crate::registry::RegistryError::NoHealthyBackend {
            service: service.to_string(),
        },
    )))
}

fn record_connect_failure(
    config: &ProxyConfig,
    service: &str,
    instance: &crate::registry::Instance,
    message: &str,
) {
    let tripped = instance.record_failure(config.max_instance_failures);
    if tripped {
        warn!(
            service = %service,
            address = %instance.address,
            failures = instance.failure_count(),
            "연속 연결 실패로 인스턴스를 비정상으로 전환"
        );
    } else {
        debug!(
            service = %service,
            address = %instance.address,
            error = %message,
            "백엔드 연결 실패 기록"
        );
    }
}

/// 연결된 스트림으로 요청을 보내고 응답을 스트리밍으로 돌려줍니다.
async fn send_request(
    config: &ProxyConfig,
    address: SocketAddr,
    stream: TcpStream,
    req: Request,
) -> Result<Response, ProxyError> {
    let io = TokioIo::new(stream);
    let (mut sender, conn) = http1::handshake(io).await?;

    // 연결 구동 태스크: 응답 본문 스트리밍이 끝날 때까지 살아있음
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "백엔드 연결 종료");
        }
    });

    let proxied_req = into_origin_form(req)?;

    // 타임아웃 시 sender와 요청 future가 드롭되면서 진행 중인 호출이 취소됨
    let response = match timeout(config.response_timeout, sender.send_request(proxied_req)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(ProxyError::Upstream(e)),
        Err(_) => {
            return Err(ProxyError::ResponseTimeout {
                address,
                timeout_secs: config.response_timeout.as_secs(),
            });
        }
    };

    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, body.boxed()))
}

/// 요청 URI를 origin-form(경로 + 쿼리)으로 바꿉니다.
///
/// 헤더(Host 포함)와 본문은 그대로 유지됩니다.
fn into_origin_form(req: Request) -> Result<Request, ProxyError> {
    let (mut parts, body) = req.into_parts();
    let target = parts.uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| "/".to_string());
    parts.uri = target.parse::<Uri>().map_err(hyper::http::Error::from)?;
    Ok(Request::from_parts(parts, body))
}
