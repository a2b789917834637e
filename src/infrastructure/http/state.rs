//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;
use tracing::Span;

use crate::application::{
    // Command handlers
    CleanupWaveformCacheHandler, ClearWaveformCacheHandler,
    // Query handlers
    GetWaveformHandler, GetWaveformStatsHandler,
    // Ports
    AudioDecoderPort, AudioFileResolverPort, GenerationLockPort, WaveformCachePort,
};
use crate::domain::waveform::ZoomLevel;

/// 波形服务设置
#[derive(Debug, Clone, Copy)]
pub struct WaveformSettings {
    /// 新生成的负载是否压缩
    pub compress: bool,
    /// 请求未指定 samplesPerPixel 时使用的缩放级别
    pub default_zoom: ZoomLevel,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            compress: true,
            default_zoom: ZoomLevel::DETAIL,
        }
    }
}

/// 应用状态
pub struct AppState {
    pub settings: WaveformSettings,

    // ========== Command Handlers ==========
    pub clear_waveform_handler: ClearWaveformCacheHandler,
    pub cleanup_waveform_handler: Arc<CleanupWaveformCacheHandler>,

    // ========== Query Handlers ==========
    pub get_waveform_handler: GetWaveformHandler,
    pub get_waveform_stats_handler: GetWaveformStatsHandler,
}

impl AppState {
    /// 创建应用状态
    ///
    /// 所有 handler 的日志挂在 `span` 之下
    pub fn new(
        cache: Arc<dyn WaveformCachePort>,
        resolver: Arc<dyn AudioFileResolverPort>,
        decoder: Arc<dyn AudioDecoderPort>,
        locks: Arc<dyn GenerationLockPort>,
        settings: WaveformSettings,
        span: Span,
    ) -> Self {
        Self {
            settings,

            // Command handlers
            clear_waveform_handler: ClearWaveformCacheHandler::new(cache.clone(), span.clone()),
            cleanup_waveform_handler: Arc::new(CleanupWaveformCacheHandler::new(
                cache.clone(),
                span.clone(),
            )),

            // Query handlers
            get_waveform_handler: GetWaveformHandler::new(
                cache.clone(),
                resolver.clone(),
                decoder,
                locks,
                settings.compress,
                span.clone(),
            ),
            get_waveform_stats_handler: GetWaveformStatsHandler::new(cache, resolver, span),
        }
    }
}
