//! # sentinel-detection
//!
//! 위반 감지 파이프라인: 수신 이벤트 → 분류 → 히스테리시스 필터.
//! I/O가 없는 동기 코드이며, 연결 태스크가 단독 소유한다.

pub mod classifier;
pub mod hysteresis;

pub use classifier::{classify, Classification, CANONICAL_REPORT_CATEGORY};
pub use hysteresis::HysteresisFilter;
