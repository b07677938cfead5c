//! Proctor Sentinel 핵심 에러 타입.
//!
//! 어댑터 crate는 이 타입을 그대로 반환하고, 바이너리만 `anyhow`로 감싼다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 인증, 백엔드 통신 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (공유 비밀키 불일치 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "PairingCode")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
