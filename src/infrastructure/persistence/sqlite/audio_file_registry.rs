//! SQLite Audio File Registry
//!
//! 从 audio_files 表读取登记信息，并在存储目录下定位物理文件

use async_trait::async_trait;
use sqlx::FromRow;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::database::{format_timestamp, parse_timestamp};
use super::DbPool;
use crate::application::ports::{
    AudioFileRecord, AudioFileResolverPort, AudioStatus, ResolveError, ResolvedAudio,
};

/// SQLite 音频文件登记表
pub struct SqliteAudioFileRegistry {
    pool: DbPool,
    audio_dir: PathBuf,
}

impl SqliteAudioFileRegistry {
    pub fn new(pool: DbPool, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            audio_dir: audio_dir.into(),
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// 物理文件路径：`{audio_dir}/{storage_key}`，没有 storage_key 时使用 id
    pub fn file_path(&self, record: &AudioFileRecord) -> PathBuf {
        match &record.storage_key {
            Some(key) => self.audio_dir.join(key),
            None => self.audio_dir.join(record.id.to_string()),
        }
    }

    /// 登记或覆盖音频文件
    pub async fn save(&self, record: &AudioFileRecord) -> Result<(), ResolveError> {
        sqlx::query(
            r#"
            INSERT INTO audio_files (id, storage_key, status, mime_type, duration, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                storage_key = excluded.storage_key,
                status = excluded.status,
                mime_type = excluded.mime_type,
                duration = excluded.duration
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.storage_key)
        .bind(record.status.as_str())
        .bind(&record.mime_type)
        .bind(record.duration)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| ResolveError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// 更新状态，duration 为 Some 时一并写入
    ///
    /// 返回是否存在该记录
    pub async fn update_status(
        &self,
        audio_id: Uuid,
        status: AudioStatus,
        duration: Option<f64>,
    ) -> Result<bool, ResolveError> {
        let result = sqlx::query(
            "UPDATE audio_files SET status = ?, duration = COALESCE(?, duration) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(duration)
        .bind(audio_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| ResolveError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(FromRow)]
struct AudioFileRow {
    id: String,
    storage_key: Option<String>,
    status: String,
    mime_type: String,
    duration: Option<f64>,
    created_at: String,
}

impl TryFrom<AudioFileRow> for AudioFileRecord {
    type Error = ResolveError;

    fn try_from(row: AudioFileRow) -> Result<Self, Self::Error> {
        let status = AudioStatus::from_str(&row.status).ok_or_else(|| {
            ResolveError::DatabaseError(format!("Unknown audio status: {}", row.status))
        })?;

        Ok(AudioFileRecord {
            id: Uuid::parse_str(&row.id).map_err(|e| ResolveError::DatabaseError(e.to_string()))?,
            storage_key: row.storage_key,
            status,
            mime_type: row.mime_type,
            duration: row.duration,
            created_at: parse_timestamp(&row.created_at)
                .map_err(|e| ResolveError::DatabaseError(e.to_string()))?,
        })
    }
}

#[async_trait]
impl AudioFileResolverPort for SqliteAudioFileRegistry {
    async fn find(&self, audio_id: Uuid) -> Result<Option<AudioFileRecord>, ResolveError> {
        let row: Option<AudioFileRow> = sqlx::query_as(
            "SELECT id, storage_key, status, mime_type, duration, created_at FROM audio_files WHERE id = ?",
        )
        .bind(audio_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ResolveError::DatabaseError(e.to_string()))?;

        row.map(AudioFileRecord::try_from).transpose()
    }

    async fn resolve(&self, audio_id: Uuid) -> Result<ResolvedAudio, ResolveError> {
        let record = self
            .find(audio_id)
            .await?
            .ok_or_else(|| ResolveError::NotFound(audio_id.to_string()))?;

        if record.status != AudioStatus::Ready {
            return Err(ResolveError::NotReady {
                audio_id,
                status: record.status,
            });
        }

        let file_path = self.file_path(&record);
        if tokio::fs::metadata(&file_path).await.is_err() {
            tracing::warn!(
                audio_id = %audio_id,
                path = %file_path.display(),
                "Audio file is registered but missing on disk"
            );
            return Err(ResolveError::NotFound(audio_id.to_string()));
        }

        Ok(ResolvedAudio {
            audio_id,
            file_path,
            status: record.status,
            mime_type: record.mime_type,
            duration: record.duration,
        })
    }
}
