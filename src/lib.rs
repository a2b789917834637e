//! Wavecache - 音频标注应用的波形生成与缓存服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Waveform Context: 缩放级别、包络归约、负载编解码
//!
//! 应用层 (application/):
//! - Ports: 端口定义（WaveformCache, AudioDecoder, AudioFileResolver, GenerationLock）
//! - Commands: 清除缓存、过期清理
//! - Queries: 获取波形、缓存统计
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Memory: 进程内生成锁
//! - Worker: CacheGcWorker 定期清理
//! - Persistence: SQLite + Sled 存储
//! - Adapters: Symphonia 音频解码

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
