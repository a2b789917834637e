//! Persistence Layer - 数据持久化
//!
//! SQLite 和 Sled 两种波形缓存后端

pub mod sled;
pub mod sqlite;

pub use self::sled::SledWaveformCache;
pub use self::sqlite::{SqliteAudioFileRegistry, SqliteWaveformCache};
