//! 백엔드 요청/응답 와이어 모델.

use serde::{Deserialize, Serialize};

use super::violation::{CheatType, StudentId, ViolationReport};

/// 페어링 요청 본문
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingRequest {
    pub pairing_code: String,
}

/// 백엔드 응답 (페어링)
///
/// `studentId`는 백엔드가 제공할 때만 존재한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 위반 보고 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationPayload {
    pub student_id: StudentId,
    pub cheat_type: CheatType,
    pub description: String,
    pub confidence_score: f64,
}

impl From<&ViolationReport> for ViolationPayload {
    fn from(report: &ViolationReport) -> Self {
        Self {
            student_id: report.student_id,
            cheat_type: report.category,
            description: report.description.clone(),
            confidence_score: report.confidence,
        }
    }
}
