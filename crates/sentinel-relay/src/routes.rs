//! 라우트 정의.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 라우트 생성
pub fn relay_routes() -> Router<AppState> {
    Router::new()
        // 디바이스 스트림 (WebSocket)
        .route("/ws", get(handlers::ws::ws_upgrade))
        // 생존 확인
        .route("/health", get(handlers::health::health))
}
