//! 优雅退出
//!
//! Linux/macOS 监听 SIGINT、SIGTERM；Windows 监听 Ctrl+C。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C / SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// 应用主动退出
    Application,
}

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("信号设置失败: {0}")]
    SignalSetup(String),
}

#[derive(Debug)]
struct ShutdownInner {
    notify: Notify,
    reason: Mutex<Option<ShutdownReason>>,
    triggered: AtomicBool,
}

/// 退出信号协调器，clone 后共享同一状态
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    inner: Arc<ShutdownInner>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                notify: Notify::new(),
                reason: Mutex::new(None),
                triggered: AtomicBool::new(false),
            }),
        }
    }

    /// 只有第一次触发生效
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self
            .inner
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("重复的退出信号被忽略: {:?}", reason);
            return;
        }
        info!("触发优雅退出: {:?}", reason);
        if let Ok(mut guard) = self.inner.reason.lock() {
            *guard = Some(reason);
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// 等待退出信号；已触发时立即返回
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        let notified = self.inner.notify.notified();
        if !self.is_shutting_down() {
            notified.await;
        }
        self.inner
            .reason
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or(ShutdownReason::Application)
    }

    /// 在后台任务中监听系统信号
    pub fn start_signal_handler(&self) -> Result<(), ShutdownError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;
            let mut sigterm = signal(SignalKind::terminate())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;
            let manager = self.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = sigint.recv() => manager.trigger_shutdown(ShutdownReason::Interrupt),
                    _ = sigterm.recv() => manager.trigger_shutdown(ShutdownReason::Terminate),
                }
            });
        }

        #[cfg(windows)]
        {
            let manager = self.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("监听Ctrl+C信号失败: {}", e);
                    return;
                }
                manager.trigger_shutdown(ShutdownReason::Interrupt);
            });
        }

        Ok(())
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
