//! 연결별 세션 상태 머신.
//!
//! `Unauthenticated` → (페어링 성공) → `Authenticated` → (연결 종료) → `Closed`
//!
//! 한 연결 태스크가 `ConnectionHandler`를 단독 소유하므로 잠금이 필요 없다.
//! 페어링은 수신 루프를 막고 기다리지만, 위반 보고는 별도 태스크로 분리되어
//! 느린 백엔드가 프레임 수신을 지연시키지 않는다.

use sentinel_core::config::RelayConfig;
use sentinel_core::error::CoreError;
use sentinel_core::models::backend::BackendAck;
use sentinel_core::models::event::InboundEvent;
use sentinel_core::models::message::OutboundMessage;
use sentinel_core::models::violation::{CheatType, StudentId, ViolationReport};
use sentinel_core::ports::backend::BackendClient;
use sentinel_detection::{classify, Classification, HysteresisFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 미인증 상태에서 보고/신호를 거부할 때의 응답
pub const NOT_AUTHENTICATED: &str = "not authenticated";

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 페어링 전 — 핸드셰이크와 PING만 처리
    Unauthenticated,
    /// 페어링 완료 — 백엔드가 할당한 학생 ID 보유
    Authenticated(StudentId),
    /// 종료 (최종 상태)
    Closed,
}

/// 연결 핸들러
pub struct ConnectionHandler {
    connection_id: Uuid,
    state: ConnectionState,
    filter: HysteresisFilter,
    config: Arc<RelayConfig>,
    backend: Arc<dyn BackendClient>,
    outbound: mpsc::Sender<OutboundMessage>,
}

impl ConnectionHandler {
    /// 새 연결 핸들러 생성 (초기 상태: 미인증)
    pub fn new(
        connection_id: Uuid,
        config: Arc<RelayConfig>,
        backend: Arc<dyn BackendClient>,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            connection_id,
            state: ConnectionState::Unauthenticated,
            filter: HysteresisFilter::new(config.detection.threshold),
            config,
            backend,
            outbound,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn filter(&self) -> &HysteresisFilter {
        &self.filter
    }

    /// 텍스트 프레임 처리 (해석 불가 프레임은 버림)
    pub async fn handle_text(&mut self, text: &str) {
        match InboundEvent::decode(text) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => debug!(connection_id = %self.connection_id, "프레임 무시: {e}"),
        }
    }

    /// 이벤트 디스패치
    pub async fn handle_event(&mut self, event: InboundEvent) {
        if self.state == ConnectionState::Closed {
            return;
        }
        debug!(connection_id = %self.connection_id, "이벤트 수신: {}", event.kind());

        match event {
            InboundEvent::Ping => self.send(OutboundMessage::pong()).await,
            InboundEvent::Handshake { pairing_code } => self.handle_handshake(&pairing_code).await,
            InboundEvent::StatusSignal { .. } => self.handle_status(event).await,
            InboundEvent::CheatReport { .. } => self.handle_report(event).await,
        }
    }

    /// 연결 종료. 이후 이벤트는 무시된다
    pub fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            debug!(
                connection_id = %self.connection_id,
                "세션 종료: streak={}", self.filter.bad_streak()
            );
        }
        self.state = ConnectionState::Closed;
    }

    async fn handle_handshake(&mut self, pairing_code: &str) {
        if pairing_code.is_empty() {
            self.send(OutboundMessage::error("pairing code is required"))
                .await;
            return;
        }

        // 이후 메시지가 결과 식별자에 의존하므로 응답까지 수신 루프를 막는다
        let result = with_deadline(self.config.request_timeout(), self.backend.pair(pairing_code)).await;

        match result {
            Ok(BackendAck {
                success: true,
                student_id,
                message,
            }) => {
                let student_id = student_id.unwrap_or_else(|| {
                    warn!(
                        connection_id = %self.connection_id,
                        "백엔드가 학생 ID를 주지 않음 — 임시 식별자 {} 사용",
                        self.config.backend.fallback_student_id
                    );
                    self.config.backend.fallback_student_id
                });

                if let ConnectionState::Authenticated(previous) = self.state {
                    info!(
                        connection_id = %self.connection_id,
                        "재페어링: student_id {previous} → {student_id}"
                    );
                }

                self.filter.reset();
                self.state = ConnectionState::Authenticated(student_id);
                info!(connection_id = %self.connection_id, student_id, "페어링 성공");

                let payload = message.unwrap_or_else(|| "Mobile device paired successfully".to_string());
                self.send(OutboundMessage::success(payload)).await;
            }
            Ok(BackendAck { message, .. }) => {
                info!(connection_id = %self.connection_id, "페어링 거부: code={pairing_code}");
                let payload = message.unwrap_or_else(|| "Invalid pairing code".to_string());
                self.send(OutboundMessage::error(payload)).await;
            }
            Err(e) => {
                warn!(connection_id = %self.connection_id, "페어링 실패: {e}");
                let payload = match e {
                    CoreError::NotFound { .. } => "Invalid pairing code",
                    _ => "pairing failed: backend unavailable",
                };
                self.send(OutboundMessage::error(payload)).await;
            }
        }
    }

    async fn handle_status(&mut self, event: InboundEvent) {
        let InboundEvent::StatusSignal {
            ref session_id,
            ref timestamp,
            ..
        } = event
        else {
            return;
        };

        let student_id = match self.state {
            ConnectionState::Authenticated(id) => id,
            ConnectionState::Unauthenticated if self.config.relay.legacy_status_frames => session_id
                .as_deref()
                .and_then(|id| id.trim().parse::<StudentId>().ok())
                .unwrap_or(self.config.backend.fallback_student_id),
            _ => {
                self.send(OutboundMessage::error(NOT_AUTHENTICATED)).await;
                return;
            }
        };

        let Some(classification) = classify(&event) else {
            return;
        };

        if let Some(category) = self.filter.observe(classification) {
            warn!(
                connection_id = %self.connection_id,
                student_id,
                "위반 확정: {category} ({}프레임 연속)",
                self.filter.threshold()
            );
            let description = format!(
                "{} ({} consecutive frames)",
                category.default_description(),
                self.filter.threshold()
            );
            let report = ViolationReport::new(
                student_id,
                category,
                timestamp.clone().unwrap_or_else(now_rfc3339),
                category.default_confidence(),
                description,
            );
            self.dispatch_violation(report);
        }
    }

    async fn handle_report(&mut self, event: InboundEvent) {
        let ConnectionState::Authenticated(student_id) = self.state else {
            self.send(OutboundMessage::error(NOT_AUTHENTICATED)).await;
            return;
        };

        let Some(Classification::Unsafe(category)) = classify(&event) else {
            return;
        };
        let InboundEvent::CheatReport { detail, .. } = event else {
            return;
        };

        // 디바이스가 이미 판단한 사건이므로 필터를 거치지 않고 바로 보고한다
        let description = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| category.default_description().to_string());
        info!(
            connection_id = %self.connection_id,
            student_id,
            "디바이스 보고 수신: {category}"
        );
        let report = ViolationReport::new(
            student_id,
            category,
            now_rfc3339(),
            category.default_confidence(),
            description,
        );
        self.dispatch_violation(report);
    }

    /// 위반 보고를 별도 태스크로 전송 (join 하지 않음)
    ///
    /// 결과는 로그로만 관찰된다. 성공 시에만 디바이스에 ACK가 나간다.
    fn dispatch_violation(&self, report: ViolationReport) {
        let backend = Arc::clone(&self.backend);
        let outbound = self.outbound.clone();
        let deadline = self.config.request_timeout();
        let connection_id = self.connection_id;

        tokio::spawn(async move {
            match with_deadline(deadline, backend.report_violation(&report)).await {
                Ok(()) => {
                    info!(
                        %connection_id,
                        student_id = report.student_id,
                        "백엔드 위반 기록 완료: {}", report.category
                    );
                    let ack = OutboundMessage::ack(ack_payload(report.category));
                    if outbound.send(ack).await.is_err() {
                        debug!(%connection_id, "ACK 전송 불가: 연결 종료됨");
                    }
                }
                Err(e) => {
                    warn!(
                        %connection_id,
                        student_id = report.student_id,
                        "위반 보고 유실 ({}): {e}", report.category
                    );
                }
            }
        });
    }

    async fn send(&self, message: OutboundMessage) {
        if self.outbound.send(message).await.is_err() {
            debug!(connection_id = %self.connection_id, "송신 채널 닫힘");
        }
    }
}

fn ack_payload(category: CheatType) -> String {
    format!("violation recorded: {category}")
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// 백엔드 호출에 상한 시간 적용
async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, CoreError>
where
    F: std::future::Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Network(format!(
            "백엔드 응답 없음: {}ms 초과",
            deadline.as_millis()
        ))),
    }
}
