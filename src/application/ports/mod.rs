//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_decoder;
mod audio_resolver;
mod generation_lock;
mod waveform_cache;

pub use audio_decoder::{AudioDecoderPort, DecodeError, DecodedAudio};
pub use audio_resolver::{
    AudioFileRecord, AudioFileResolverPort, AudioStatus, ResolveError, ResolvedAudio,
};
pub use generation_lock::{GenerationGuard, GenerationLockPort};
pub use waveform_cache::{
    cache_timestamp, CacheError, NewWaveformCacheEntry, WaveformCacheEntry, WaveformCachePort,
};
