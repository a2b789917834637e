//! Waveform Cache Port - 波形缓存存储
//!
//! 以 (audio_id, zoom_level) 为唯一键的持久化缓存，
//! 具体实现见 SQLite 和 Sled 两个后端

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::waveform::ZoomLevel;

/// Waveform Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 波形缓存条目
///
/// `payload` 为序列化（通常已压缩）后的包络，只在缓存层内部流转
#[derive(Debug, Clone)]
pub struct WaveformCacheEntry {
    pub id: Uuid,
    pub audio_id: Uuid,
    pub zoom_level: ZoomLevel,
    pub payload: Vec<u8>,
    pub is_compressed: bool,
    /// 音频时长（秒）
    pub duration: f64,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub payload_size_bytes: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub hit_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 缓存时间戳统一为微秒精度，与 SQLite 中的文本存储一致
pub fn cache_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// 新建缓存条目所需的生成信息
#[derive(Debug, Clone)]
pub struct NewWaveformCacheEntry {
    pub audio_id: Uuid,
    pub zoom_level: ZoomLevel,
    pub payload: Vec<u8>,
    pub is_compressed: bool,
    pub duration: f64,
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl WaveformCacheEntry {
    /// 首次生成时的条目：hit_count = 1，访问时间为当前时间
    pub fn generated(new: NewWaveformCacheEntry, now: DateTime<Utc>) -> Self {
        let now = cache_timestamp(now);
        let payload_size_bytes = new.payload.len() as u64;
        Self {
            id: Uuid::new_v4(),
            audio_id: new.audio_id,
            zoom_level: new.zoom_level,
            payload: new.payload,
            is_compressed: new.is_compressed,
            duration: new.duration,
            sample_rate: new.sample_rate,
            channel_count: new.channel_count,
            payload_size_bytes,
            last_accessed_at: now,
            hit_count: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Waveform Cache Port
///
/// - 同一 (audio_id, zoom_level) 最多一条记录
/// - 单条写入是原子的
/// - 删除不存在的条目返回 0，不视为错误
#[async_trait]
pub trait WaveformCachePort: Send + Sync {
    /// 按唯一键查找
    async fn find(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<Option<WaveformCacheEntry>, CacheError>;

    /// 列出某个音频的全部缩放级别，按 zoom_level 升序
    async fn find_by_audio(&self, audio_id: Uuid) -> Result<Vec<WaveformCacheEntry>, CacheError>;

    /// 不存在则创建，存在则覆盖数据字段（保留 id 与 created_at）
    async fn upsert(&self, entry: &WaveformCacheEntry) -> Result<(), CacheError>;

    /// 记录一次命中：hit_count + 1，last_accessed_at = now
    async fn touch(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Result<(), CacheError>;

    /// 删除指定级别，或在 zoom_level 为 None 时删除该音频的全部级别
    async fn delete_by_audio(
        &self,
        audio_id: Uuid,
        zoom_level: Option<ZoomLevel>,
    ) -> Result<u64, CacheError>;

    /// 删除 last_accessed_at 严格早于 cutoff 的所有条目
    ///
    /// 存储的时间戳为微秒精度，cutoff 可带纳秒
    async fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError>;
}
