use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use hyper_util::rt::TokioIo;
use tracing::{error, info};

use crate::middleware::ClientInfo;
use crate::settings::Settings;
use crate::tls::{build_acceptor, CertificateStore};
use super::admin::AdminHandler;
use super::handler::RequestHandler;
use super::Result;

/// 진입점 리스너 묶음입니다.
///
/// HTTP 리스너는 항상 열리고, HTTPS와 관리 리스너는 설정에 따라
/// 열립니다. 각 연결은 독립 태스크로 처리되어 수락 루프를 막지
/// 않습니다.
pub struct ServerListener {
    http_listener: TcpListener,
    https: Option<(TcpListener, TlsAcceptor)>,
    admin_listener: Option<TcpListener>,
}

impl ServerListener {
    pub async fn new(settings: &Settings) -> Result<Self> {
        let http_listener = TcpListener::bind(format!("0.0.0.0:{}", settings.server.http_port))
            .await
            .map_err(|e| {
                error!(error = %e, port = settings.server.http_port, "HTTP 포트 바인딩 실패");
                e
            })?;
        info!(port = settings.server.http_port, "HTTP 리스너 시작");

        let https = if settings.server.https_enabled {
            let store = Arc::new(CertificateStore::from_settings(&settings.tls)?);
            let acceptor = build_acceptor(store);
            let listener = TcpListener::bind(format!("0.0.0.0:{}", settings.server.https_port))
                .await
                .map_err(|e| {
                    error!(error = %e, port = settings.server.https_port, "HTTPS 포트 바인딩 실패");
                    e
                })?;
            info!(port = settings.server.https_port, "HTTPS 리스너 시작");
            Some((listener, acceptor))
        } else {
            None
        };

        let admin_listener = if settings.admin.enabled {
            let listener = TcpListener::bind(format!("0.0.0.0:{}", settings.admin.port))
                .await
                .map_err(|e| {
                    error!(error = %e, port = settings.admin.port, "관리 포트 바인딩 실패");
                    e
                })?;
            info!(port = settings.admin.port, "관리 리스너 시작");
            Some(listener)
        } else {
            None
        };

        Ok(Self {
            http_listener,
            https,
            admin_listener,
        })
    }

    pub async fn run(
        self,
        handler: Arc<RequestHandler>,
        admin_handler: Arc<AdminHandler>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                result = self.http_listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let handler = handler.clone();
                            let client = ClientInfo { peer_addr, scheme: "http" };
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                if let Err(err) = handler.handle_connection(io, client).await {
                                    error!(error = %err, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTP 연결 수락 실패");
                        }
                    }
                }

                result = async {
                    match &self.https {
                        Some((listener, _)) => listener.accept().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let handler = handler.clone();
                            let acceptor = self.https.as_ref()
                                .map(|(_, acceptor)| acceptor.clone())
                                .expect("https 분기는 설정이 있을 때만 선택됨");
                            let client = ClientInfo { peer_addr, scheme: "https" };

                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        let io = TokioIo::new(tls_stream);
                                        if let Err(err) = handler.handle_connection(io, client).await {
                                            error!(error = %err, "HTTPS 연결 처리 실패");
                                        }
                                    }
                                    Err(e) => {
                                        error!(error = %e, "TLS 핸드쉐이크 실패");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTPS 연결 수락 실패");
                        }
                    }
                }

                result = async {
                    match &self.admin_listener {
                        Some(listener) => listener.accept().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match result {
                        Ok((stream, _)) => {
                            let admin_handler = admin_handler.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                if let Err(err) = admin_handler.handle_connection(io).await {
                                    error!(error = %err, "관리 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "관리 연결 수락 실패");
                        }
                    }
                }
            }
        }
    }
}
