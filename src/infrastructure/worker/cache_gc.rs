//! Cache GC Worker - 定期清理长期未访问的波形缓存

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::application::{CleanupWaveformCache, CleanupWaveformCacheHandler};

/// GC Worker 配置
#[derive(Debug, Clone)]
pub struct CacheGcConfig {
    /// 清理间隔
    pub interval: Duration,
    /// 保留天数
    pub retention_days: u32,
}

impl Default for CacheGcConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            retention_days: crate::application::DEFAULT_RETENTION_DAYS,
        }
    }
}

/// 缓存 GC Worker
pub struct CacheGcWorker {
    config: CacheGcConfig,
    handler: Arc<CleanupWaveformCacheHandler>,
    shutdown: watch::Receiver<bool>,
}

impl CacheGcWorker {
    pub fn new(
        config: CacheGcConfig,
        handler: Arc<CleanupWaveformCacheHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// 启动 Worker，收到关闭信号后返回
    pub async fn run(mut self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            retention_days = self.config.retention_days,
            "CacheGcWorker started"
        );

        // 首次清理在一个间隔之后
        let start = tokio::time::Instant::now() + self.config.interval;
        let mut ticker = tokio::time::interval_at(start, self.config.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("CacheGcWorker stopped");
    }

    /// 执行一轮清理，失败只记录日志
    async fn run_once(&self) {
        let command = CleanupWaveformCache {
            retention_days: self.config.retention_days,
        };

        match self.handler.handle(command).await {
            Ok(removed) => {
                tracing::debug!(removed = removed, "Cache GC round finished");
            }
            Err(e) => {
                tracing::error!(error = %e, "Cache GC round failed");
            }
        }
    }
}
