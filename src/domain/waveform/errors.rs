//! Waveform Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("无效的缩放级别: {0}（每像素采样点数必须为正整数）")]
    InvalidZoomLevel(u32),
}

/// 波形负载编解码错误
///
/// 缓存负载损坏或序列化失败时返回，不做重试
#[derive(Debug, Error)]
pub enum PayloadCodecError {
    #[error("Failed to serialize waveform: {0}")]
    Serialize(String),

    #[error("Failed to compress waveform: {0}")]
    Compress(String),

    #[error("Failed to decompress waveform: {0}")]
    Decompress(String),

    #[error("Failed to parse waveform: {0}")]
    Parse(String),

    #[error("Waveform payload has odd number of values: {0}")]
    OddLength(usize),
}
