//! Sled Persistence - 嵌入式键值存储

mod waveform_cache;

pub use waveform_cache::{SledCacheConfig, SledWaveformCache};
