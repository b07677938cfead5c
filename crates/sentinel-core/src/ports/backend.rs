//! 백엔드(위반 기록 서버) 포트.
//!
//! 구현: `sentinel-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::backend::BackendAck;
use crate::models::violation::ViolationReport;

/// 권한 있는 백엔드 클라이언트
///
/// 구현체는 모든 요청에 공유 비밀키를 첨부하고, 짧은 타임아웃을 적용하며, 재시도하지 않는다.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// 페어링 코드 검증
    ///
    /// 성공 시 백엔드가 할당한 학생 ID가 포함될 수 있다.
    async fn pair(&self, pairing_code: &str) -> Result<BackendAck, CoreError>;

    /// 확정된 위반 보고
    async fn report_violation(&self, report: &ViolationReport) -> Result<(), CoreError>;
}
