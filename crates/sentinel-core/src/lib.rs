//! # sentinel-core
//!
//! Proctor Sentinel 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (디바이스 프레임, 위반 보고, 백엔드 응답)
//! - [`ports`] — 백엔드 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 릴레이 설정 구조체 및 로더

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
