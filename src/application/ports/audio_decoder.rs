//! Audio Decoder Port - 音频解码抽象
//!
//! 将任意受支持格式的音频文件解码为按声道拆分的 PCM 采样

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Audio stream is empty")]
    EmptyStream,
}

/// 解码后的音频
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// 每个声道一组采样，取值范围 [-1.0, 1.0]，各声道长度一致
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// 每声道采样帧数
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// 由采样帧数推算的时长（秒）
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

/// Audio Decoder Port
///
/// 失败时返回 `DecodeError`，绝不返回空数据
#[async_trait]
pub trait AudioDecoderPort: Send + Sync {
    async fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError>;
}
