//! # sentinel-relay
//!
//! 디바이스 ↔ 백엔드 실시간 릴레이 서버.
//! Axum 기반 WebSocket 수신 + 연결별 위반 감지 상태 머신.
//!
//! ## 기능
//! - `/ws` 디바이스 스트림 (페어링, PING, 상태 신호, 부정행위 보고)
//! - `/health` 생존 확인
//! - 확정된 위반을 백엔드로 비동기 전달 (재시도 없음)

pub mod handlers;
pub mod routes;
pub mod session;

use axum::Router;
use sentinel_core::config::RelayConfig;
use sentinel_core::ports::backend::BackendClient;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use session::{ConnectionHandler, ConnectionState};

/// 서버 공유 상태 (읽기 전용)
#[derive(Clone)]
pub struct AppState {
    /// 시작 시 한 번 생성된 설정
    pub config: Arc<RelayConfig>,
    /// 백엔드 클라이언트
    pub backend: Arc<dyn BackendClient>,
}

/// 릴레이 서버
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    /// 새 릴레이 서버 생성
    pub fn new(config: Arc<RelayConfig>, backend: Arc<dyn BackendClient>) -> Self {
        Self {
            state: AppState { config, backend },
        }
    }

    /// 라우터 구성
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::relay_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 설정된 주소에 바인드 후 실행
    ///
    /// # Arguments
    /// * `shutdown_rx` - 종료 신호 수신 채널
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let addr = self.state.config.listen_addr();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener, shutdown_rx).await
    }

    /// 이미 바인드된 리스너로 실행 (테스트는 0번 포트 사용)
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let app = self.router();
        info!("릴레이 서버 시작: ws://{}/ws", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("릴레이 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("릴레이 서버 종료");
        Ok(())
    }
}
