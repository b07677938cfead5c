//! 포트 인터페이스 (trait).
//!
//! 어댑터 crate가 이 trait들을 구현하며,
//! `sentinel-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로로 object safety를 보장한다.

pub mod backend;
