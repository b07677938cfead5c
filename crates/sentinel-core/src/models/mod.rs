//! Proctor Sentinel 도메인 모델.
//!
//! 디바이스 ↔ 릴레이 ↔ 백엔드 사이에서 오가는 데이터 구조체를 정의한다.
//! 와이어 포맷이 있는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod backend;
pub mod event;
pub mod message;
pub mod violation;
