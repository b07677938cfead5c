//! 릴레이 종료 제어.
//!
//! OS 시그널 하나를 받으면 `RelayServer::serve`가 구독 중인 watch 채널에 `true`를 보낸다.
//! 서버는 새 연결 수락을 멈추고 진행 중인 WebSocket 연결이 닫히기를 기다린다.

use tokio::sync::watch;
use tracing::info;

/// 종료 트리거 (서버 쪽은 `subscribe()`로 받은 수신기만 가진다)
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// 릴레이 서버에 넘길 수신기
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// 릴레이 종료 요청 (중복 호출 무해)
    pub fn trigger(&self, reason: &str) {
        info!("릴레이 종료 요청: {reason}");
        self.tx.send_replace(true);
    }

    /// SIGINT/SIGTERM (비 unix는 Ctrl+C) 대기 후 종료 요청
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        let reason = received_signal().await?;
        self.trigger(reason);
        Ok(())
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn received_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    })
}

#[cfg(not(unix))]
async fn received_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
