//! HTTP/WebSocket 핸들러.

pub mod health;
pub mod ws;
