//! SQLite Database - 数据库连接和迁移

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接串
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/wavecache.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // WAL 模式，允许读写并发
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "SQLite pool created with WAL mode and busy_timeout=5000ms"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 音频文件登记表（由上传流程写入）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audio_files (
            id TEXT PRIMARY KEY,
            storage_key TEXT,
            status TEXT NOT NULL DEFAULT 'uploading',
            mime_type TEXT NOT NULL,
            duration REAL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 波形缓存表，(audio_id, samples_per_pixel) 唯一
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS waveform_cache (
            id TEXT PRIMARY KEY,
            audio_id TEXT NOT NULL,
            samples_per_pixel INTEGER NOT NULL,
            payload BLOB NOT NULL,
            is_compressed INTEGER NOT NULL DEFAULT 1,
            duration REAL NOT NULL,
            sample_rate INTEGER NOT NULL,
            channels INTEGER NOT NULL,
            payload_size_bytes INTEGER NOT NULL,
            last_accessed_at TEXT NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (audio_id, samples_per_pixel)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_waveform_cache_audio_id
        ON waveform_cache(audio_id)
        "#,
    )
    .execute(pool)
    .await?;

    // 过期清理按最后访问时间扫描
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_waveform_cache_last_accessed
        ON waveform_cache(last_accessed_at)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// 定长 RFC3339 文本（微秒精度、`Z` 结尾），保证按字符串比较与时间顺序一致
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 比较用的 cutoff 文本：向上取整到微秒，使 `stored < cutoff` 与纳秒精度下的比较等价
pub(crate) fn format_cutoff(cutoff: &DateTime<Utc>) -> String {
    let sub_micros = i64::from(cutoff.timestamp_subsec_nanos() % 1_000);
    let rounded = if sub_micros == 0 {
        *cutoff
    } else {
        cutoff
            .checked_add_signed(Duration::nanoseconds(1_000 - sub_micros))
            .unwrap_or(*cutoff)
    };
    format_timestamp(&rounded)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::cache_timestamp;

    #[tokio::test]
    async fn test_create_in_memory_db() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 重复执行迁移不报错
        run_migrations(&pool).await.unwrap();
    }

    #[test]
    fn test_timestamp_text_order_matches_time_order() {
        let base = Utc::now();
        let earlier = format_timestamp(&(base - Duration::milliseconds(1)));
        let later = format_timestamp(&base);
        assert!(earlier < later);
        assert_eq!(later.len(), earlier.len());

        let parsed = parse_timestamp(&later).unwrap();
        assert_eq!(format_timestamp(&parsed), later);
    }

    #[test]
    fn test_cutoff_rounds_up_to_next_micro() {
        let aligned = cache_timestamp(Utc::now());

        assert_eq!(format_cutoff(&aligned), format_timestamp(&aligned));
        assert_eq!(
            format_cutoff(&(aligned + Duration::nanoseconds(1))),
            format_timestamp(&(aligned + Duration::microseconds(1)))
        );
    }
}
