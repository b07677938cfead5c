//! 생존 확인 핸들러.

/// GET /health
///
/// 항상 200을 반환한다.
pub async fn health() -> &'static str {
    "Proctor Sentinel relay is UP"
}
