//! 위반(부정행위) 모델.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 백엔드가 할당한 학생(세션) 식별자
pub type StudentId = i64;

/// 백엔드가 허용하는 부정행위 유형 (고정 열거형)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheatType {
    NoFaceDetected,
    MultipleFacesDetected,
    LookingAway,
    MobilePhoneDetected,
    TabSwitch,
    CopyPasteDetected,
    SuspiciousAudio,
    UnauthorizedObject,
}

impl CheatType {
    /// 와이어 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            CheatType::NoFaceDetected => "NO_FACE_DETECTED",
            CheatType::MultipleFacesDetected => "MULTIPLE_FACES_DETECTED",
            CheatType::LookingAway => "LOOKING_AWAY",
            CheatType::MobilePhoneDetected => "MOBILE_PHONE_DETECTED",
            CheatType::TabSwitch => "TAB_SWITCH",
            CheatType::CopyPasteDetected => "COPY_PASTE_DETECTED",
            CheatType::SuspiciousAudio => "SUSPICIOUS_AUDIO",
            CheatType::UnauthorizedObject => "UNAUTHORIZED_OBJECT",
        }
    }

    /// 유형별 기본 신뢰도
    pub fn default_confidence(&self) -> f64 {
        match self {
            CheatType::MultipleFacesDetected => 1.0,
            CheatType::MobilePhoneDetected => 0.95,
            CheatType::NoFaceDetected => 0.9,
            CheatType::LookingAway => 0.8,
            CheatType::SuspiciousAudio => 0.6,
            _ => 0.7,
        }
    }

    /// 감독관용 기본 설명문
    pub fn default_description(&self) -> &'static str {
        match self {
            CheatType::NoFaceDetected => "User left frame",
            CheatType::MultipleFacesDetected => "Multiple faces detected",
            CheatType::LookingAway => "Sustained looking away from screen",
            CheatType::MobilePhoneDetected => "Mobile phone activity detected",
            CheatType::TabSwitch => "Browser focus lost",
            CheatType::CopyPasteDetected => "Copy/paste activity detected",
            CheatType::SuspiciousAudio => "Suspicious audio detected",
            CheatType::UnauthorizedObject => "Unauthorized object detected",
        }
    }
}

impl fmt::Display for CheatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NO_FACE_DETECTED" => Ok(CheatType::NoFaceDetected),
            "MULTIPLE_FACES_DETECTED" => Ok(CheatType::MultipleFacesDetected),
            "LOOKING_AWAY" => Ok(CheatType::LookingAway),
            "MOBILE_PHONE_DETECTED" => Ok(CheatType::MobilePhoneDetected),
            "TAB_SWITCH" => Ok(CheatType::TabSwitch),
            "COPY_PASTE_DETECTED" => Ok(CheatType::CopyPasteDetected),
            "SUSPICIOUS_AUDIO" => Ok(CheatType::SuspiciousAudio),
            "UNAUTHORIZED_OBJECT" => Ok(CheatType::UnauthorizedObject),
            other => Err(format!("알 수 없는 부정행위 유형: {other}")),
        }
    }
}

/// 확정된 위반 보고
///
/// 위반 1건당 한 번 생성되어 릴레이 태스크로 이동한 뒤 폐기된다.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationReport {
    pub student_id: StudentId,
    pub category: CheatType,
    pub timestamp: String,
    pub confidence: f64,
    pub description: String,
}

impl ViolationReport {
    pub fn new(
        student_id: StudentId,
        category: CheatType,
        timestamp: String,
        confidence: f64,
        description: String,
    ) -> Self {
        Self {
            student_id,
            category,
            timestamp,
            confidence,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&CheatType::MobilePhoneDetected).unwrap();
        assert_eq!(json, "\"MOBILE_PHONE_DETECTED\"");
    }

    #[test]
    fn from_str_matches_as_str() {
        for ty in [
            CheatType::NoFaceDetected,
            CheatType::LookingAway,
            CheatType::MobilePhoneDetected,
            CheatType::UnauthorizedObject,
        ] {
            assert_eq!(ty.as_str().parse::<CheatType>().unwrap(), ty);
        }
        assert_eq!(
            " looking_away ".parse::<CheatType>().unwrap(),
            CheatType::LookingAway
        );
        assert!("GYRO_SPIN".parse::<CheatType>().is_err());
    }

    #[test]
    fn confidence_is_bounded() {
        for ty in [
            CheatType::MultipleFacesDetected,
            CheatType::SuspiciousAudio,
            CheatType::TabSwitch,
        ] {
            let c = ty.default_confidence();
            assert!(c > 0.0 && c <= 1.0);
        }
    }
}
