//! Waveform Queries - 波形查询

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::waveform::{Envelope, ZoomLevel};

/// 获取波形查询
#[derive(Debug, Clone)]
pub struct GetWaveformQuery {
    pub audio_id: Uuid,
    pub zoom_level: ZoomLevel,
}

/// 获取波形响应
#[derive(Debug, Clone)]
pub struct GetWaveformResponse {
    pub audio_id: Uuid,
    pub envelope: Envelope,
    pub zoom_level: ZoomLevel,
    /// 音频时长（秒）
    pub duration: f64,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub from_cache: bool,
    pub generated_at: DateTime<Utc>,
}

/// 获取波形缓存统计查询
#[derive(Debug, Clone)]
pub struct GetWaveformStatsQuery {
    pub audio_id: Uuid,
}

/// 三个固定档位的缓存状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCacheStatus {
    pub overview: bool,
    pub detail: bool,
    pub zoom: bool,
}

/// 波形缓存统计响应
#[derive(Debug, Clone)]
pub struct WaveformStatsResponse {
    pub audio_id: Uuid,
    pub cache_status: TierCacheStatus,
    pub duration: Option<f64>,
    /// 所有缓存条目中最大的 updated_at，无缓存时为 Unix 纪元
    pub last_updated_at: DateTime<Utc>,
}
