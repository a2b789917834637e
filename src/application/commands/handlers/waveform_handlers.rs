//! Waveform Command Handlers

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{Instrument, Span};

use crate::application::commands::{
    CleanupWaveformCache, ClearWaveformCache, MAX_RETENTION_DAYS,
};
use crate::application::error::ApplicationError;
use crate::application::ports::WaveformCachePort;

// ============================================================================
// ClearWaveformCache
// ============================================================================

/// ClearWaveformCache Handler
///
/// 删除不存在的缓存不是错误，返回删除条数
pub struct ClearWaveformCacheHandler {
    cache: Arc<dyn WaveformCachePort>,
    span: Span,
}

impl ClearWaveformCacheHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>, span: Span) -> Self {
        Self { cache, span }
    }

    pub async fn handle(&self, command: ClearWaveformCache) -> Result<u64, ApplicationError> {
        let span = tracing::info_span!(
            parent: &self.span,
            "clear_waveform_cache",
            audio_id = %command.audio_id,
            samples_per_pixel = command.zoom_level.map(|z| z.samples_per_pixel()),
        );

        async move {
            let removed = self
                .cache
                .delete_by_audio(command.audio_id, command.zoom_level)
                .await?;

            tracing::info!(removed = removed, "Waveform cache cleared");

            Ok(removed)
        }
        .instrument(span)
        .await
    }
}

// ============================================================================
// CleanupWaveformCache
// ============================================================================

fn retention_cutoff(
    now: DateTime<Utc>,
    retention_days: u32,
) -> Result<DateTime<Utc>, ApplicationError> {
    if retention_days > MAX_RETENTION_DAYS {
        return Err(ApplicationError::validation(format!(
            "retention days must be at most {}, got {}",
            MAX_RETENTION_DAYS, retention_days
        )));
    }

    Duration::try_days(i64::from(retention_days))
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or_else(|| {
            ApplicationError::validation(format!("retention days out of range: {}", retention_days))
        })
}

/// CleanupWaveformCache Handler - 按最后访问时间淘汰
pub struct CleanupWaveformCacheHandler {
    cache: Arc<dyn WaveformCachePort>,
    span: Span,
}

impl CleanupWaveformCacheHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>, span: Span) -> Self {
        Self { cache, span }
    }

    pub async fn handle(&self, command: CleanupWaveformCache) -> Result<u64, ApplicationError> {
        let span = tracing::info_span!(
            parent: &self.span,
            "cleanup_waveform_cache",
            retention_days = command.retention_days,
        );

        async move {
            let cutoff = retention_cutoff(Utc::now(), command.retention_days)?;
            let removed = self.cache.sweep_older_than(cutoff).await?;

            tracing::info!(
                removed = removed,
                cutoff = %cutoff.to_rfc3339(),
                "Expired waveform cache cleaned up"
            );

            Ok(removed)
        }
        .instrument(span)
        .await
    }
}
