//! 릴레이 설정 구조체.
//!
//! 수신 포트, 백엔드 URL/공유 비밀키, 히스테리시스 임계값 등 런타임 설정을 정의한다.
//! `config` crate를 통해 파일/환경변수에서 로드하며, 시작 시 한 번 생성된 뒤 변경되지 않는다.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;

/// 환경변수 접두어 (예: `SENTINEL_BACKEND__BASE_URL`)
pub const ENV_PREFIX: &str = "SENTINEL";

/// 최상위 릴레이 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 수신 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 백엔드 연결 설정
    #[serde(default)]
    pub backend: BackendConfig,
    /// 위반 감지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 연결별 세션 정책
    #[serde(default)]
    pub relay: RelaySessionConfig,
}

// ============================================================
// 수신 서버 설정
// ============================================================

/// 수신 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 바인드 주소
    #[serde(default = "default_host")]
    pub host: String,
    /// 수신 포트 (기본: 8081)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

// ============================================================
// 백엔드 설정
// ============================================================

/// 백엔드 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// 백엔드 기본 URL (예: "http://localhost:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 공유 비밀키
    #[serde(default)]
    pub api_key: String,
    /// 비밀키를 싣는 헤더 이름
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 페어링 엔드포인트 경로
    #[serde(default = "default_handshake_path")]
    pub handshake_path: String,
    /// 위반 보고 엔드포인트 경로
    #[serde(default = "default_report_path")]
    pub report_path: String,
    /// 백엔드가 학생 ID를 주지 않을 때 쓰는 임시 식별자
    #[serde(default = "default_fallback_student_id")]
    pub fallback_student_id: i64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            timeout_ms: default_timeout_ms(),
            handshake_path: default_handshake_path(),
            report_path: default_report_path(),
            fallback_student_id: default_fallback_student_id(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_key_header() -> String {
    "X-API-KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_handshake_path() -> String {
    "/api/proctor/mobile/handshake".to_string()
}

fn default_report_path() -> String {
    "/api/proctor/report".to_string()
}

fn default_fallback_student_id() -> i64 {
    1
}

// ============================================================
// 위반 감지 설정
// ============================================================

/// 위반 감지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 위반 확정에 필요한 연속 비정상 신호 수 (약 1초 분량)
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> u32 {
    30
}

// ============================================================
// 세션 정책
// ============================================================

/// 연결별 세션 정책
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySessionConfig {
    /// 페어링 없이 레거시 상태 프레임 허용
    #[serde(default)]
    pub legacy_status_frames: bool,
    /// 연결별 송신 큐 크기
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for RelaySessionConfig {
    fn default() -> Self {
        Self {
            legacy_status_frames: false,
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    32
}

impl RelayConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정 로드 — 기본값 → 설정 파일(선택) → 환경변수 순으로 덮어쓴다.
    pub fn load(file: Option<&Path>) -> Result<Self, CoreError> {
        Self::load_with_env(file, None)
    }

    /// 환경변수 소스를 직접 지정하여 로드 (`None`이면 프로세스 환경 사용)
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, CoreError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            if !path.exists() {
                return Err(CoreError::Config(format!(
                    "설정 파일 없음: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: RelayConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            "설정 로드 완료: port={}, backend={}",
            config.server.port,
            config.backend.base_url
        );
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.detection.threshold == 0 {
            return Err(CoreError::Validation {
                field: "detection.threshold".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.backend.timeout_ms == 0 {
            return Err(CoreError::Validation {
                field: "backend.timeout_ms".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "backend.base_url".to_string(),
                message: "비어 있음".to_string(),
            });
        }
        if self.backend.api_key_header.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "backend.api_key_header".to_string(),
                message: "비어 있음".to_string(),
            });
        }
        if self.relay.outbound_buffer == 0 {
            return Err(CoreError::Validation {
                field: "relay.outbound_buffer".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        Ok(())
    }

    /// 백엔드 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }

    /// 바인드 주소 문자열 (`host:port`)
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = RelayConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr(), "0.0.0.0:8081");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.backend.fallback_student_id, 1);
    }

    #[test]
    fn load_without_sources_gives_defaults() {
        let config = RelayConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.detection.threshold, 30);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = RelayConfig::load_with_env(
            None,
            env(&[
                ("SENTINEL_SERVER__PORT", "9100"),
                ("SENTINEL_BACKEND__BASE_URL", "http://backend:8080"),
                ("SENTINEL_BACKEND__API_KEY", "s3cret"),
                ("SENTINEL_DETECTION__THRESHOLD", "10"),
                ("SENTINEL_RELAY__LEGACY_STATUS_FRAMES", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.backend.base_url, "http://backend:8080");
        assert_eq!(config.backend.api_key, "s3cret");
        assert_eq!(config.detection.threshold, 10);
        assert!(config.relay.legacy_status_frames);
    }

    #[test]
    fn file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://from-file:8080\"\napi_key = \"file-key\"\n\n[detection]\nthreshold = 12"
        )
        .unwrap();

        let config = RelayConfig::load_with_env(
            Some(file.path()),
            env(&[("SENTINEL_BACKEND__API_KEY", "env-key")]),
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "http://from-file:8080");
        assert_eq!(config.backend.api_key, "env-key");
        assert_eq!(config.detection.threshold, 12);
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = RelayConfig::load_with_env(Some(Path::new("/nonexistent/sentinel.toml")), None);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut config = RelayConfig::default_config();
        config.detection.threshold = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("detection.threshold"));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let mut config = RelayConfig::default_config();
        config.backend.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
