//! Audio File Resolver Port - 音频文件定位
//!
//! 音频文件的上传与存储由外部系统负责，这里只定义波形生成所需的查询接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// 解析错误
#[derive(Debug, Error)]
pub enum ResolveError {
    /// 音频 ID 不存在，或物理文件已丢失
    #[error("Audio file not found: {0}")]
    NotFound(String),

    /// 音频存在但尚未就绪（上传中 / 处理中）
    #[error("Audio file {audio_id} is not ready (status: {status})")]
    NotReady { audio_id: Uuid, status: AudioStatus },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 音频文件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl AudioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioStatus::Uploading => "uploading",
            AudioStatus::Processing => "processing",
            AudioStatus::Ready => "ready",
            AudioStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "uploading" => Some(AudioStatus::Uploading),
            "processing" => Some(AudioStatus::Processing),
            "ready" => Some(AudioStatus::Ready),
            "error" => Some(AudioStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 音频文件登记信息
#[derive(Debug, Clone)]
pub struct AudioFileRecord {
    pub id: Uuid,
    /// 存储目录下的文件名，为空时使用 id
    pub storage_key: Option<String>,
    pub status: AudioStatus,
    pub mime_type: String,
    /// 时长（秒）
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// 可直接解码的音频文件
#[derive(Debug, Clone)]
pub struct ResolvedAudio {
    pub audio_id: Uuid,
    pub file_path: PathBuf,
    pub status: AudioStatus,
    pub mime_type: String,
    pub duration: Option<f64>,
}

/// Audio File Resolver Port
#[async_trait]
pub trait AudioFileResolverPort: Send + Sync {
    /// 查询登记信息，不检查状态与物理文件
    async fn find(&self, audio_id: Uuid) -> Result<Option<AudioFileRecord>, ResolveError>;

    /// 定位物理文件
    ///
    /// - 未登记或文件缺失 → `NotFound`
    /// - 状态不是 ready → `NotReady`
    async fn resolve(&self, audio_id: Uuid) -> Result<ResolvedAudio, ResolveError>;
}
