//! Sled-based Waveform Cache Implementation
//!
//! 键格式：`waveform:{audio_id}:{samples_per_pixel:010}`，
//! 零填充使同一音频的前缀扫描按缩放级别升序返回

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use uuid::Uuid;

use crate::application::ports::{
    cache_timestamp, CacheError, WaveformCacheEntry, WaveformCachePort,
};
use crate::domain::waveform::ZoomLevel;

const KEY_PREFIX: &str = "waveform:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/waveform.sled".to_string(),
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    id: Uuid,
    audio_id: Uuid,
    samples_per_pixel: u32,
    payload: Vec<u8>,
    is_compressed: bool,
    duration: f64,
    sample_rate: u32,
    channel_count: u16,
    payload_size_bytes: u64,
    last_accessed_at: DateTime<Utc>,
    hit_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&WaveformCacheEntry> for InternalCacheEntry {
    fn from(entry: &WaveformCacheEntry) -> Self {
        Self {
            id: entry.id,
            audio_id: entry.audio_id,
            samples_per_pixel: entry.zoom_level.samples_per_pixel(),
            payload: entry.payload.clone(),
            is_compressed: entry.is_compressed,
            duration: entry.duration,
            sample_rate: entry.sample_rate,
            channel_count: entry.channel_count,
            payload_size_bytes: entry.payload_size_bytes,
            last_accessed_at: entry.last_accessed_at,
            hit_count: entry.hit_count,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

impl TryFrom<InternalCacheEntry> for WaveformCacheEntry {
    type Error = CacheError;

    fn try_from(entry: InternalCacheEntry) -> Result<Self, Self::Error> {
        Ok(WaveformCacheEntry {
            id: entry.id,
            audio_id: entry.audio_id,
            zoom_level: ZoomLevel::new(entry.samples_per_pixel)
                .map_err(|e| CacheError::SerializationError(e.to_string()))?,
            payload: entry.payload,
            is_compressed: entry.is_compressed,
            duration: entry.duration,
            sample_rate: entry.sample_rate,
            channel_count: entry.channel_count,
            payload_size_bytes: entry.payload_size_bytes,
            last_accessed_at: entry.last_accessed_at,
            hit_count: entry.hit_count,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }
}

fn entry_key(audio_id: Uuid, zoom_level: ZoomLevel) -> String {
    format!(
        "{}{}:{:010}",
        KEY_PREFIX,
        audio_id,
        zoom_level.samples_per_pixel()
    )
}

fn audio_prefix(audio_id: Uuid) -> String {
    format!("{}{}:", KEY_PREFIX, audio_id)
}

fn decode_entry(bytes: &[u8]) -> Result<InternalCacheEntry, CacheError> {
    bincode::deserialize(bytes).map_err(|e| CacheError::SerializationError(e.to_string()))
}

/// Sled 波形缓存
pub struct SledWaveformCache {
    db: Db,
}

impl SledWaveformCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let total_entries = db.scan_prefix(KEY_PREFIX).count();

        tracing::info!(
            db_path = %config.db_path,
            total_entries = total_entries,
            "SledWaveformCache initialized"
        );

        Ok(Self { db })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
        };
        Self::new(&config)
    }

    /// 删除前缀下的全部键，不解码取值
    fn remove_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        for key in self.db.scan_prefix(prefix).keys() {
            let key = key.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if self
                .db
                .remove(&key)
                .map_err(|e| CacheError::DatabaseError(e.to_string()))?
                .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// 删除前缀下满足条件的条目，返回删除条数
    ///
    /// 无法解码的条目永远无法命中，一并删除
    fn remove_where<F>(&self, prefix: &str, predicate: F) -> Result<u64, CacheError>
    where
        F: Fn(&InternalCacheEntry) -> bool,
    {
        let mut removed = 0u64;
        for item in self.db.scan_prefix(prefix) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            let matched = match decode_entry(&value) {
                Ok(entry) => predicate(&entry),
                Err(e) => {
                    tracing::warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %e,
                        "Removing undecodable waveform cache entry"
                    );
                    true
                }
            };
            if matched
                && self
                    .db
                    .remove(&key)
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?
                    .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl WaveformCachePort for SledWaveformCache {
    async fn find(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<Option<WaveformCacheEntry>, CacheError> {
        match self.db.get(entry_key(audio_id, zoom_level)) {
            Ok(Some(data)) => Ok(Some(WaveformCacheEntry::try_from(decode_entry(&data)?)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn find_by_audio(&self, audio_id: Uuid) -> Result<Vec<WaveformCacheEntry>, CacheError> {
        let mut entries = Vec::new();
        for item in self.db.scan_prefix(audio_prefix(audio_id)) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            entries.push(WaveformCacheEntry::try_from(decode_entry(&value)?)?);
        }
        Ok(entries)
    }

    async fn upsert(&self, entry: &WaveformCacheEntry) -> Result<(), CacheError> {
        let incoming = InternalCacheEntry::from(entry);
        let incoming_bytes = bincode::serialize(&incoming)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        // 已存在时保留 id 与 created_at
        self.db
            .update_and_fetch(entry_key(entry.audio_id, entry.zoom_level), |old| {
                let merged = old
                    .and_then(|bytes| bincode::deserialize::<InternalCacheEntry>(bytes).ok())
                    .and_then(|existing| {
                        let mut merged = incoming.clone();
                        merged.id = existing.id;
                        merged.created_at = existing.created_at;
                        bincode::serialize(&merged).ok()
                    });
                Some(merged.unwrap_or_else(|| incoming_bytes.clone()))
            })
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            audio_id = %entry.audio_id,
            samples_per_pixel = entry.zoom_level.samples_per_pixel(),
            payload_size_bytes = entry.payload_size_bytes,
            "Waveform cached"
        );

        Ok(())
    }

    async fn touch(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Result<(), CacheError> {
        let now = cache_timestamp(Utc::now());
        self.db
            .update_and_fetch(entry_key(audio_id, zoom_level), |old| {
                let bytes = old?;
                match bincode::deserialize::<InternalCacheEntry>(bytes) {
                    Ok(mut entry) => {
                        entry.hit_count += 1;
                        entry.last_accessed_at = now;
                        bincode::serialize(&entry).ok().or_else(|| Some(bytes.to_vec()))
                    }
                    Err(_) => Some(bytes.to_vec()),
                }
            })
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete_by_audio(
        &self,
        audio_id: Uuid,
        zoom_level: Option<ZoomLevel>,
    ) -> Result<u64, CacheError> {
        match zoom_level {
            Some(zoom) => {
                let removed = self
                    .db
                    .remove(entry_key(audio_id, zoom))
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
                Ok(u64::from(removed.is_some()))
            }
            None => self.remove_prefix(&audio_prefix(audio_id)),
        }
    }

    async fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        self.remove_where(KEY_PREFIX, |entry| entry.last_accessed_at < cutoff)
    }
}
