//! # sentinel-network
//!
//! 백엔드 HTTP 어댑터.
//! 페어링 핸드셰이크와 위반 보고를 `BackendClient` 포트로 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use sentinel_network::http_client::HttpBackendClient;
//!
//! let client = HttpBackendClient::new(&config.backend)?;
//! let ack = client.pair("ABC123").await?;
//! ```

pub mod http_client;
