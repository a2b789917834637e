//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{GetWaveformResponse, TierCacheStatus, WaveformStatsResponse};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Waveform DTOs
// ============================================================================

/// 缩放级别参数，缺省使用服务端默认值
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformParams {
    pub samples_per_pixel: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformDto {
    pub audio_id: Uuid,
    /// 扁平化的 [min0, max0, min1, max1, ...]
    pub data: Vec<f32>,
    pub samples_per_pixel: u32,
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub from_cache: bool,
    pub generated_at: String,
}

impl From<GetWaveformResponse> for WaveformDto {
    fn from(r: GetWaveformResponse) -> Self {
        Self {
            audio_id: r.audio_id,
            data: r.envelope.to_flat(),
            samples_per_pixel: r.zoom_level.samples_per_pixel(),
            duration: r.duration,
            sample_rate: r.sample_rate,
            channels: r.channel_count,
            from_cache: r.from_cache,
            generated_at: r.generated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatusDto {
    pub overview: bool,
    pub detail: bool,
    pub zoom: bool,
}

impl From<TierCacheStatus> for CacheStatusDto {
    fn from(s: TierCacheStatus) -> Self {
        Self {
            overview: s.overview,
            detail: s.detail,
            zoom: s.zoom,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformStatsDto {
    pub audio_id: Uuid,
    pub cache_status: CacheStatusDto,
    pub duration: Option<f64>,
    pub last_updated_at: String,
}

impl From<WaveformStatsResponse> for WaveformStatsDto {
    fn from(r: WaveformStatsResponse) -> Self {
        Self {
            audio_id: r.audio_id,
            cache_status: r.cache_status.into(),
            duration: r.duration,
            last_updated_at: r.last_updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemovedDto {
    pub removed: u64,
}
