//! Worker Layer - Background Task Processing
//!
//! 实现 CacheGcWorker，定期淘汰过期波形缓存

mod cache_gc;

pub use cache_gc::{CacheGcConfig, CacheGcWorker};
