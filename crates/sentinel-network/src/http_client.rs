//! 백엔드 HTTP 클라이언트.
//!
//! `BackendClient` 포트 구현. 공유 비밀키 헤더 자동 주입, 짧은 타임아웃, 재시도 없음.
//! 실패한 위반 보고는 로그만 남고 유실된다 (중복 억제는 필터가 이미 수행).

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use sentinel_core::config::BackendConfig;
use sentinel_core::error::CoreError;
use sentinel_core::models::backend::{BackendAck, PairingRequest, ViolationPayload};
use sentinel_core::models::violation::ViolationReport;
use sentinel_core::ports::backend::BackendClient;
use std::time::Duration;
use tracing::{debug, warn};

/// 백엔드 클라이언트 — `BackendClient` 포트 구현
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
    api_key_header: HeaderName,
    api_key: HeaderValue,
    handshake_path: String,
    report_path: String,
}

impl HttpBackendClient {
    /// 새 백엔드 클라이언트 생성
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes()).map_err(
            |e| CoreError::Config(format!("잘못된 비밀키 헤더 이름 '{}': {e}", config.api_key_header)),
        )?;
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| CoreError::Config(format!("비밀키에 헤더로 쓸 수 없는 문자 포함: {e}")))?;
        api_key.set_sensitive(true);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key_header,
            api_key,
            handshake_path: config.handshake_path.clone(),
            report_path: config.report_path.clone(),
        })
    }

    /// 비밀키 헤더가 포함된 POST 요청 빌더 반환
    fn authorized_post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(url)
            .header(self.api_key_header.clone(), self.api_key.clone())
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(
        &self,
        resp: reqwest::Response,
        resource_type: &str,
    ) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            401 | 403 => Err(CoreError::Auth(format!("백엔드 인증 실패 ({status}): {text}"))),
            404 => Err(CoreError::NotFound {
                resource_type: resource_type.to_string(),
                id: text,
            }),
            503 => Err(CoreError::ServiceUnavailable(text)),
            _ => Err(CoreError::Internal(format!("백엔드 에러 ({status}): {text}"))),
        }
    }
}

/// 전송 단계 에러 매핑
fn transport_error(context: &str, e: reqwest::Error) -> CoreError {
    if e.is_timeout() {
        CoreError::Network(format!("{context}: 타임아웃"))
    } else {
        CoreError::Network(format!("{context}: {e}"))
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn pair(&self, pairing_code: &str) -> Result<BackendAck, CoreError> {
        debug!("페어링 요청: code={pairing_code}");

        let body = PairingRequest {
            pairing_code: pairing_code.to_string(),
        };
        let resp = self
            .authorized_post(&self.handshake_path)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("페어링 요청 실패", e))?;

        let resp = self.check_response(resp, "PairingCode").await?;
        let ack: BackendAck = resp
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("페어링 응답 파싱 실패: {e}")))?;

        debug!(
            "페어링 응답: success={}, student_id={:?}",
            ack.success, ack.student_id
        );
        Ok(ack)
    }

    async fn report_violation(&self, report: &ViolationReport) -> Result<(), CoreError> {
        debug!(
            "위반 보고: student_id={}, type={}",
            report.student_id, report.category
        );

        let body = ViolationPayload::from(report);
        let resp = self
            .authorized_post(&self.report_path)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("위반 보고 실패", e))?;

        // 중복 억제 시에도 200. 본문은 해석하지 않는다
        self.check_response(resp, "Student").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use sentinel_core::models::violation::CheatType;

    fn config_for(url: &str) -> BackendConfig {
        BackendConfig {
            base_url: url.to_string(),
            api_key: "test-secret".to_string(),
            timeout_ms: 2_000,
            ..BackendConfig::default()
        }
    }

    fn sample_report() -> ViolationReport {
        ViolationReport::new(
            42,
            CheatType::LookingAway,
            "2026-01-30T12:00:00Z".to_string(),
            0.8,
            "Sustained looking away from screen".to_string(),
        )
    }

    /// 닫힌 포트 주소
    fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    #[test]
    fn client_creation_trims_trailing_slash() {
        let client = HttpBackendClient::new(&config_for("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.api_key_header.as_str(), "x-api-key");
        assert!(client.api_key.is_sensitive());
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let mut config = config_for("http://localhost:8080");
        config.api_key_header = "bad header".to_string();
        assert!(matches!(
            HttpBackendClient::new(&config),
            Err(CoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn pair_success_with_student_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/proctor/mobile/handshake")
            .match_header("x-api-key", "test-secret")
            .match_body(Matcher::Json(serde_json::json!({"pairingCode": "ABC123"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"studentId":42,"message":"Mobile device paired successfully"}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let ack = client.pair("ABC123").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.student_id, Some(42));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn pair_success_without_student_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/proctor/mobile/handshake")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let ack = client.pair("ABC123").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.student_id, None);
    }

    #[tokio::test]
    async fn pair_invalid_code_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/proctor/mobile/handshake")
            .with_status(404)
            .with_body(r#"{"success":false,"message":"Invalid pairing code"}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let result = client.pair("WRONG").await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn report_sends_backend_payload_with_secret() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/proctor/report")
            .match_header("x-api-key", "test-secret")
            .match_body(Matcher::Json(serde_json::json!({
                "studentId": 42,
                "cheatType": "LOOKING_AWAY",
                "description": "Sustained looking away from screen",
                "confidenceScore": 0.8
            })))
            .with_status(200)
            .with_body(r#"{"status":"logged","incidentId":1}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let result = client.report_violation(&sample_report()).await;
        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn report_throttled_text_body_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/proctor/report")
            .with_status(200)
            .with_body("Incident acknowledged but throttled.")
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        assert!(client.report_violation(&sample_report()).await.is_ok());
    }

    #[tokio::test]
    async fn report_401_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/proctor/report")
            .with_status(401)
            .with_body("Invalid API Key")
            .expect(1)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let err = client.report_violation(&sample_report()).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));
        assert!(err.to_string().contains("인증"));
        // 재시도 없음
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn report_503_is_service_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/proctor/report")
            .with_status(503)
            .with_body("Service Unavailable")
            .expect(1)
            .create_async()
            .await;

        let client = HttpBackendClient::new(&config_for(&server.url())).unwrap();
        let err = client.report_violation(&sample_report()).await.unwrap_err();
        assert!(matches!(err, CoreError::ServiceUnavailable(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let client = HttpBackendClient::new(&config_for(&unreachable_url())).unwrap();
        let err = client.report_violation(&sample_report()).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));

        let err = client.pair("ABC123").await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }
}
