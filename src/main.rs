use edge_gateway::logging::init_logging;
use edge_gateway::server::ServerManager;
use edge_gateway::settings::Settings;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&settings.logging);
    info!(
        http_port = settings.server.http_port,
        https_enabled = settings.server.https_enabled,
        docker_enabled = settings.docker.enabled,
        "edge_gateway 시작"
    );

    let mut manager = match ServerManager::new(settings).await {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "서버 매니저 생성 실패");
            std::process::exit(1);
        }
    };

    if let Err(e) = manager.start().await {
        error!(error = %e, "서버 실행 실패");
        std::process::exit(1);
    }
}
