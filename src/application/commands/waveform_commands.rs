//! Waveform Commands - 波形缓存管理

use uuid::Uuid;

use crate::domain::waveform::ZoomLevel;

/// 默认缓存保留天数
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// 保留天数上限（约 100 年），超出后 cutoff 无法表示
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// 清除波形缓存命令
///
/// `zoom_level` 为 None 时清除该音频的全部缩放级别
#[derive(Debug, Clone)]
pub struct ClearWaveformCache {
    pub audio_id: Uuid,
    pub zoom_level: Option<ZoomLevel>,
}

/// 清理长期未访问的波形缓存（LRU）
#[derive(Debug, Clone)]
pub struct CleanupWaveformCache {
    pub retention_days: u32,
}

impl Default for CleanupWaveformCache {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}
