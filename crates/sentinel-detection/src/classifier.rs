//! 신호 분류기.
//!
//! 수신 이벤트를 정상/비정상 판정과 부정행위 유형으로 변환한다.

use sentinel_core::models::event::{InboundEvent, SignalStatus};
use sentinel_core::models::violation::CheatType;
use tracing::debug;

/// 자유 형식 보고의 정규 카테고리.
/// 클라이언트가 주장한 카테고리는 신뢰하지 않고 항상 이 값으로 덮어쓴다.
pub const CANONICAL_REPORT_CATEGORY: CheatType = CheatType::MobilePhoneDetected;

/// 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Safe,
    Unsafe(CheatType),
}

impl Classification {
    pub fn is_safe(&self) -> bool {
        matches!(self, Classification::Safe)
    }
}

/// 상태 신호 → 부정행위 유형
pub fn status_category(status: SignalStatus) -> Option<CheatType> {
    match status {
        SignalStatus::Safe => None,
        SignalStatus::LookingAway => Some(CheatType::LookingAway),
        SignalStatus::PhoneDetected => Some(CheatType::MobilePhoneDetected),
        SignalStatus::NoFace => Some(CheatType::NoFaceDetected),
    }
}

/// 이벤트 분류
///
/// 신호가 아닌 이벤트(페어링, PING)는 `None`.
pub fn classify(event: &InboundEvent) -> Option<Classification> {
    match event {
        InboundEvent::StatusSignal { status, .. } => Some(match status_category(*status) {
            Some(category) => Classification::Unsafe(category),
            None => Classification::Safe,
        }),
        InboundEvent::CheatReport {
            claimed_category, ..
        } => {
            if let Some(claimed) = claimed_category {
                if claimed.parse::<CheatType>().ok() != Some(CANONICAL_REPORT_CATEGORY) {
                    debug!(
                        "보고 카테고리 무시: claimed={claimed}, 적용={}",
                        CANONICAL_REPORT_CATEGORY
                    );
                }
            }
            Some(Classification::Unsafe(CANONICAL_REPORT_CATEGORY))
        }
        InboundEvent::Handshake { .. } | InboundEvent::Ping => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: SignalStatus) -> InboundEvent {
        InboundEvent::StatusSignal {
            status: s,
            session_id: None,
            timestamp: None,
        }
    }

    #[test]
    fn safe_status_is_safe() {
        assert_eq!(classify(&status(SignalStatus::Safe)), Some(Classification::Safe));
    }

    #[test]
    fn unsafe_statuses_carry_category() {
        assert_eq!(
            classify(&status(SignalStatus::LookingAway)),
            Some(Classification::Unsafe(CheatType::LookingAway))
        );
        assert_eq!(
            classify(&status(SignalStatus::PhoneDetected)),
            Some(Classification::Unsafe(CheatType::MobilePhoneDetected))
        );
        assert_eq!(
            classify(&status(SignalStatus::NoFace)),
            Some(Classification::Unsafe(CheatType::NoFaceDetected))
        );
    }

    #[test]
    fn report_category_is_overridden() {
        let event = InboundEvent::CheatReport {
            claimed_category: Some("TAB_SWITCH".to_string()),
            detail: None,
        };
        assert_eq!(
            classify(&event),
            Some(Classification::Unsafe(CANONICAL_REPORT_CATEGORY))
        );
    }

    #[test]
    fn report_without_category_is_unsafe() {
        let event = InboundEvent::CheatReport {
            claimed_category: None,
            detail: Some("device moved".to_string()),
        };
        assert!(!classify(&event).unwrap().is_safe());
    }

    #[test]
    fn non_signals_are_not_classified() {
        assert_eq!(classify(&InboundEvent::Ping), None);
        assert_eq!(
            classify(&InboundEvent::Handshake {
                pairing_code: "X".to_string()
            }),
            None
        );
    }
}
