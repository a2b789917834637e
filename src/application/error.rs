//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CacheError, DecodeError, ResolveError};
use crate::domain::waveform::{PayloadCodecError, WaveformError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 资源尚未就绪，调用方稍后重试
    #[error("Not ready: {0}")]
    NotReady(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 音频解码失败
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// 波形负载编解码失败
    #[error("Payload codec error: {0}")]
    PayloadCodecError(String),

    /// 缓存存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<DecodeError> for ApplicationError {
    fn from(err: DecodeError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<PayloadCodecError> for ApplicationError {
    fn from(err: PayloadCodecError) -> Self {
        Self::PayloadCodecError(err.to_string())
    }
}

impl From<WaveformError> for ApplicationError {
    fn from(err: WaveformError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ResolveError> for ApplicationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(id) => Self::not_found("Audio file", id),
            ResolveError::NotReady { .. } => Self::NotReady(err.to_string()),
            ResolveError::DatabaseError(msg) => Self::StorageError(msg),
        }
    }
}
