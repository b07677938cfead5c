//! 디바이스 송신 메시지 모델.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 송신 메시지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundKind {
    /// 페어링 성공
    Success,
    /// 요청 거부 또는 실패
    Error,
    /// PING 응답
    Pong,
    /// 위반 보고가 백엔드에 기록됨
    Ack,
}

/// 디바이스로 보내는 `{type, payload}` 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    pub payload: String,
}

impl OutboundMessage {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            kind: OutboundKind::Success,
            payload: payload.into(),
        }
    }

    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            kind: OutboundKind::Error,
            payload: payload.into(),
        }
    }

    pub fn pong() -> Self {
        Self {
            kind: OutboundKind::Pong,
            payload: String::new(),
        }
    }

    pub fn ack(payload: impl Into<String>) -> Self {
        Self {
            kind: OutboundKind::Ack,
            payload: payload.into(),
        }
    }

    /// JSON 텍스트 프레임으로 직렬화
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_tag() {
        let json = OutboundMessage::error("not authenticated").to_json().unwrap();
        assert_eq!(json, r#"{"type":"ERROR","payload":"not authenticated"}"#);
    }

    #[test]
    fn pong_has_empty_payload() {
        let json = OutboundMessage::pong().to_json().unwrap();
        assert_eq!(json, r#"{"type":"PONG","payload":""}"#);
    }
}
