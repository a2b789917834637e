//! SQLite Persistence - SQLite 数据库持久化实现

mod audio_file_registry;
mod database;
mod waveform_cache_repo;

pub use audio_file_registry::*;
pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub use waveform_cache_repo::*;
