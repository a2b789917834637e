//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（WaveformCache、AudioDecoder、AudioFileResolver、GenerationLock）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    handlers::{CleanupWaveformCacheHandler, ClearWaveformCacheHandler},
    CleanupWaveformCache, ClearWaveformCache, DEFAULT_RETENTION_DAYS,
    MAX_RETENTION_DAYS,
};

pub use error::ApplicationError;

pub use ports::{
    // Audio decoder
    AudioDecoderPort,
    DecodeError,
    DecodedAudio,
    // Audio resolver
    AudioFileRecord,
    AudioFileResolverPort,
    AudioStatus,
    ResolveError,
    ResolvedAudio,
    // Generation lock
    GenerationGuard,
    GenerationLockPort,
    // Waveform cache
    CacheError,
    NewWaveformCacheEntry,
    WaveformCacheEntry,
    WaveformCachePort,
};

pub use queries::{
    handlers::{GetWaveformHandler, GetWaveformStatsHandler},
    GetWaveformQuery, GetWaveformResponse, GetWaveformStatsQuery, TierCacheStatus,
    WaveformStatsResponse,
};
