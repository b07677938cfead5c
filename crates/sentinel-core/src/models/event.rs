//! 디바이스 수신 이벤트 모델.
//!
//! 한 WebSocket 텍스트 프레임 = 한 이벤트.
//! `{type, payload}` 봉투 형식과 레거시 상태 프레임(`{session_id, status, timestamp}`)을 모두 해석한다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// 시선/카메라 분석 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    /// 정상
    Safe,
    /// 화면 밖을 보고 있음
    LookingAway,
    /// 휴대폰 감지
    PhoneDetected,
    /// 얼굴 미검출
    NoFace,
}

/// 디바이스에서 수신한 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// 상태 신호 (레거시 시선 엔진 프레임)
    StatusSignal {
        status: SignalStatus,
        /// 프레임에 실린 세션 식별자 (레거시)
        session_id: Option<String>,
        timestamp: Option<String>,
    },
    /// 페어링 요청
    Handshake { pairing_code: String },
    /// 생존 확인
    Ping,
    /// 디바이스가 자체 판단한 부정행위 보고
    CheatReport {
        /// 클라이언트가 주장한 카테고리 (신뢰하지 않음)
        claimed_category: Option<String>,
        detail: Option<String>,
    },
}

impl InboundEvent {
    /// 텍스트 프레임 해석
    ///
    /// 해석 불가능한 프레임은 에러를 반환하며, 호출자는 해당 메시지를 버리고 루프를 계속한다.
    pub fn decode(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)?;

        let Value::Object(ref map) = value else {
            return Err(CoreError::Validation {
                field: "frame".to_string(),
                message: "JSON 객체가 아님".to_string(),
            });
        };

        if map.contains_key("type") {
            let envelope: Envelope = serde_json::from_value(value)?;
            return envelope.into_event();
        }

        if map.contains_key("status") {
            let frame: StatusFrame = serde_json::from_value(value)?;
            return Ok(InboundEvent::StatusSignal {
                status: frame.status,
                session_id: frame.session_id.and_then(value_to_id),
                timestamp: frame.timestamp,
            });
        }

        Err(CoreError::Validation {
            field: "type".to_string(),
            message: "type/status 필드 없음".to_string(),
        })
    }

    /// 로그용 이벤트 종류 이름
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::StatusSignal { .. } => "STATUS",
            InboundEvent::Handshake { .. } => "HANDSHAKE",
            InboundEvent::Ping => "PING",
            InboundEvent::CheatReport { .. } => "CHEAT_REPORT",
        }
    }
}

/// `{type, payload}` 봉투
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl Envelope {
    fn into_event(self) -> Result<InboundEvent, CoreError> {
        match self.kind.as_str() {
            "HANDSHAKE" => {
                let pairing_code = match self.payload {
                    Value::String(code) => code.trim().to_string(),
                    Value::Null => String::new(),
                    other => {
                        return Err(CoreError::Validation {
                            field: "payload".to_string(),
                            message: format!("페어링 코드는 문자열이어야 함: {other}"),
                        })
                    }
                };
                Ok(InboundEvent::Handshake { pairing_code })
            }
            "PING" => Ok(InboundEvent::Ping),
            "CHEAT_REPORT" => {
                // payload는 JSON 문자열이 원칙, 객체를 직접 보내는 클라이언트도 허용
                let report: ReportPayload = match self.payload {
                    Value::String(raw) => serde_json::from_str(&raw)?,
                    obj @ Value::Object(_) => serde_json::from_value(obj)?,
                    other => {
                        return Err(CoreError::Validation {
                            field: "payload".to_string(),
                            message: format!("보고 payload 형식 오류: {other}"),
                        })
                    }
                };
                Ok(InboundEvent::CheatReport {
                    claimed_category: report.category,
                    detail: report.detail,
                })
            }
            other => Err(CoreError::Validation {
                field: "type".to_string(),
                message: format!("알 수 없는 이벤트 타입: {other}"),
            }),
        }
    }
}

/// 레거시 상태 프레임
#[derive(Debug, Deserialize)]
struct StatusFrame {
    #[serde(default)]
    session_id: Option<Value>,
    status: SignalStatus,
    #[serde(default)]
    timestamp: Option<String>,
}

/// CHEAT_REPORT payload 내부 JSON
#[derive(Debug, Deserialize)]
struct ReportPayload {
    #[serde(default, alias = "cheatType")]
    category: Option<String>,
    #[serde(default, alias = "description")]
    detail: Option<String>,
}

fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
