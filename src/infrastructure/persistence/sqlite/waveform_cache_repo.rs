//! SQLite Waveform Cache

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::database::{format_cutoff, format_timestamp, parse_timestamp};
use super::DbPool;
use crate::application::ports::{
    cache_timestamp, CacheError, WaveformCacheEntry, WaveformCachePort,
};
use crate::domain::waveform::ZoomLevel;

const SELECT_COLUMNS: &str = "SELECT id, audio_id, samples_per_pixel, payload, is_compressed, duration, sample_rate, channels, payload_size_bytes, last_accessed_at, hit_count, created_at, updated_at FROM waveform_cache";

/// SQLite 波形缓存
pub struct SqliteWaveformCache {
    pool: DbPool,
}

impl SqliteWaveformCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct WaveformCacheRow {
    id: String,
    audio_id: String,
    samples_per_pixel: i64,
    payload: Vec<u8>,
    is_compressed: bool,
    duration: f64,
    sample_rate: i64,
    channels: i64,
    payload_size_bytes: i64,
    last_accessed_at: String,
    hit_count: i64,
    created_at: String,
    updated_at: String,
}

fn serialization_error(e: impl ToString) -> CacheError {
    CacheError::SerializationError(e.to_string())
}

fn database_error(e: sqlx::Error) -> CacheError {
    CacheError::DatabaseError(e.to_string())
}

impl TryFrom<WaveformCacheRow> for WaveformCacheEntry {
    type Error = CacheError;

    fn try_from(row: WaveformCacheRow) -> Result<Self, Self::Error> {
        let samples_per_pixel = u32::try_from(row.samples_per_pixel).map_err(serialization_error)?;

        Ok(WaveformCacheEntry {
            id: Uuid::parse_str(&row.id).map_err(serialization_error)?,
            audio_id: Uuid::parse_str(&row.audio_id).map_err(serialization_error)?,
            zoom_level: ZoomLevel::new(samples_per_pixel).map_err(serialization_error)?,
            payload: row.payload,
            is_compressed: row.is_compressed,
            duration: row.duration,
            sample_rate: row.sample_rate as u32,
            channel_count: row.channels as u16,
            payload_size_bytes: row.payload_size_bytes as u64,
            last_accessed_at: parse_timestamp(&row.last_accessed_at).map_err(serialization_error)?,
            hit_count: row.hit_count as u64,
            created_at: parse_timestamp(&row.created_at).map_err(serialization_error)?,
            updated_at: parse_timestamp(&row.updated_at).map_err(serialization_error)?,
        })
    }
}

#[async_trait]
impl WaveformCachePort for SqliteWaveformCache {
    async fn find(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<Option<WaveformCacheEntry>, CacheError> {
        let row: Option<WaveformCacheRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE audio_id = ? AND samples_per_pixel = ?"
        ))
        .bind(audio_id.to_string())
        .bind(i64::from(zoom_level.samples_per_pixel()))
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(WaveformCacheEntry::try_from).transpose()
    }

    async fn find_by_audio(&self, audio_id: Uuid) -> Result<Vec<WaveformCacheEntry>, CacheError> {
        let rows: Vec<WaveformCacheRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE audio_id = ? ORDER BY samples_per_pixel"
        ))
        .bind(audio_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(WaveformCacheEntry::try_from).collect()
    }

    async fn upsert(&self, entry: &WaveformCacheEntry) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            INSERT INTO waveform_cache (id, audio_id, samples_per_pixel, payload, is_compressed, duration, sample_rate, channels, payload_size_bytes, last_accessed_at, hit_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(audio_id, samples_per_pixel) DO UPDATE SET
                payload = excluded.payload,
                is_compressed = excluded.is_compressed,
                duration = excluded.duration,
                sample_rate = excluded.sample_rate,
                channels = excluded.channels,
                payload_size_bytes = excluded.payload_size_bytes,
                last_accessed_at = excluded.last_accessed_at,
                hit_count = excluded.hit_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.audio_id.to_string())
        .bind(i64::from(entry.zoom_level.samples_per_pixel()))
        .bind(&entry.payload)
        .bind(entry.is_compressed)
        .bind(entry.duration)
        .bind(i64::from(entry.sample_rate))
        .bind(i64::from(entry.channel_count))
        .bind(entry.payload_size_bytes as i64)
        .bind(format_timestamp(&entry.last_accessed_at))
        .bind(entry.hit_count as i64)
        .bind(format_timestamp(&entry.created_at))
        .bind(format_timestamp(&entry.updated_at))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn touch(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Result<(), CacheError> {
        sqlx::query(
            "UPDATE waveform_cache SET hit_count = hit_count + 1, last_accessed_at = ? WHERE audio_id = ? AND samples_per_pixel = ?",
        )
        .bind(format_timestamp(&cache_timestamp(Utc::now())))
        .bind(audio_id.to_string())
        .bind(i64::from(zoom_level.samples_per_pixel()))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn delete_by_audio(
        &self,
        audio_id: Uuid,
        zoom_level: Option<ZoomLevel>,
    ) -> Result<u64, CacheError> {
        let result = match zoom_level {
            Some(zoom) => {
                sqlx::query("DELETE FROM waveform_cache WHERE audio_id = ? AND samples_per_pixel = ?")
                    .bind(audio_id.to_string())
                    .bind(i64::from(zoom.samples_per_pixel()))
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM waveform_cache WHERE audio_id = ?")
                    .bind(audio_id.to_string())
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM waveform_cache WHERE last_accessed_at < ?")
            .bind(format_cutoff(&cutoff))
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
