//! 디바이스 WebSocket 핸들러.
//!
//! 연결 하나당 수신 태스크 하나와 송신 태스크 하나.
//! 수신 루프가 `ConnectionHandler`를 단독 소유하고, 응답과 ACK는 송신 채널을 거쳐 나간다.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use sentinel_core::models::message::OutboundMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::ConnectionHandler;
use crate::AppState;

/// WebSocket 업그레이드 엔드포인트
///
/// GET /ws
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

/// 연결 하나의 수명 전체
///
/// 읽기 실패나 종료 프레임에서 루프를 빠져나오며, 세션 상태는 모두 함께 해제된다.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "디바이스 연결");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(state.config.relay.outbound_buffer);

    // 송신 태스크 (채널 닫힘 또는 쓰기 실패 시 종료)
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(%connection_id, "응답 직렬화 실패: {e}");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                debug!(%connection_id, "송신 실패: {e}");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut handler = ConnectionHandler::new(
        connection_id,
        state.config.clone(),
        state.backend.clone(),
        tx,
    );

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => handler.handle_text(text.as_str()).await,
            Ok(Message::Binary(data)) => {
                debug!(%connection_id, "바이너리 프레임 무시: {} bytes", data.len());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // Ping/Pong은 자동 처리
            Err(e) => {
                debug!(%connection_id, "수신 에러: {e}");
                break;
            }
        }
    }

    handler.close();
    info!(%connection_id, "디바이스 연결 종료");
}
