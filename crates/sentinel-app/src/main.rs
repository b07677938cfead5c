//! # sentinel-app
//!
//! Proctor Sentinel 릴레이 바이너리 진입점.
//! 설정 로드, 백엔드 어댑터 생성, 릴레이 서버 기동, 시그널 기반 종료.

mod lifecycle;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_core::config::RelayConfig;
use sentinel_core::ports::backend::BackendClient;
use sentinel_network::http_client::HttpBackendClient;
use sentinel_relay::RelayServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::ShutdownController;

/// Proctor Sentinel 릴레이
///
/// 감독 디바이스의 WebSocket 신호를 받아 지속된 위반만 백엔드에 보고한다
#[derive(Parser, Debug)]
#[command(name = "proctor-sentinel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (TOML/YAML/JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 수신 주소
    #[arg(long)]
    host: Option<String>,

    /// 수신 포트 (기본: 8081)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 백엔드 URL (기본: http://localhost:8080)
    #[arg(long, short = 'b')]
    backend_url: Option<String>,

    /// 위반 확정에 필요한 연속 비정상 프레임 수
    #[arg(long, short = 't')]
    threshold: Option<u32>,

    /// 페어링 없는 레거시 상태 프레임 허용
    #[arg(long)]
    legacy_status_frames: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

impl Args {
    /// CLI 인자로 설정 오버라이드 (파일/환경변수보다 우선)
    fn apply_to(&self, config: &mut RelayConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref url) = self.backend_url {
            config.backend.base_url = url.clone();
        }
        if let Some(threshold) = self.threshold {
            config.detection.threshold = threshold;
        }
        if self.legacy_status_frames {
            config.relay.legacy_status_frames = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "proctor_sentinel={0},sentinel_app={0},sentinel_core={0},sentinel_detection={0},sentinel_network={0},sentinel_relay={0},tower_http=warn",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정 로드: 기본값 → 파일 → 환경변수 → CLI
    let mut config = RelayConfig::load(args.config.as_deref()).context("설정 로드 실패")?;
    args.apply_to(&mut config);
    config.validate().context("설정 검증 실패")?;

    info!("Proctor Sentinel 시작");
    info!("백엔드: {}", config.backend.base_url);
    info!("위반 임계값: {}프레임", config.detection.threshold);
    if config.backend.api_key.is_empty() {
        warn!("백엔드 비밀키 미설정 — 보고가 거부될 수 있음");
    }
    if config.relay.legacy_status_frames {
        warn!(
            "레거시 상태 프레임 허용 — 페어링 없는 프레임은 학생 ID {}로 귀속될 수 있음",
            config.backend.fallback_student_id
        );
    }

    let backend: Arc<dyn BackendClient> =
        Arc::new(HttpBackendClient::new(&config.backend).context("백엔드 클라이언트 생성 실패")?);

    let server = RelayServer::new(Arc::new(config), backend);
    let shutdown = ShutdownController::new();
    let mut server_task = tokio::spawn(server.run(shutdown.subscribe()));

    info!("릴레이 실행 중 (Ctrl+C로 종료)");

    tokio::select! {
        // 바인드 실패 등으로 서버가 먼저 끝난 경우
        result = &mut server_task => {
            result.context("릴레이 서버 태스크 패닉")?.context("릴레이 서버 오류")?;
            return Ok(());
        }
        signal = shutdown.wait_for_signal() => {
            if let Err(e) = signal {
                error!("시그널 핸들러 등록 실패: {e}");
                shutdown.trigger("시그널 핸들러 없음");
            }
        }
    }

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("릴레이 서버 오류: {e}"),
        Err(e) => error!("릴레이 서버 태스크 에러: {e}"),
    }

    info!("Proctor Sentinel 종료");
    Ok(())
}
