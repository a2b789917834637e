//! Configuration Loader
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheBackend};
use crate::application::MAX_RETENTION_DAYS;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "WAVECACHE";

/// 加载应用配置
///
/// # 环境变量示例
/// - `WAVECACHE_SERVER__PORT=8080`
/// - `WAVECACHE_CACHE__BACKEND=sled`
/// - `WAVECACHE_GC__RETENTION_DAYS=7`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索当前目录下的默认配置文件
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("database.path", "data/wavecache.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.audio_dir", "data/audio")?
        .set_default("cache.backend", "sqlite")?
        .set_default("cache.sled_path", "data/waveform.sled")?
        .set_default("cache.compress", true)?
        .set_default("cache.default_samples_per_pixel", 100)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 86400)?
        .set_default("gc.retention_days", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: WAVECACHE_CACHE__COMPRESS=false
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let app_config: AppConfig = builder.build()?.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.cache.default_samples_per_pixel == 0 {
        return Err(ConfigError::ValidationError(
            "Default samples_per_pixel must be positive".to_string(),
        ));
    }

    if config.cache.backend == CacheBackend::Sled && config.cache.sled_path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Sled path cannot be empty when the sled backend is selected".to_string(),
        ));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    if config.gc.retention_days > MAX_RETENTION_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "GC retention_days must be at most {}",
            MAX_RETENTION_DAYS
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Audio Directory: {:?}", config.storage.audio_dir);
    tracing::info!("Cache Backend: {}", config.cache.backend.as_str());
    if config.cache.backend == CacheBackend::Sled {
        tracing::info!("Sled Path: {}", config.cache.sled_path);
    }
    tracing::info!("Compress Payloads: {}", config.cache.compress);
    tracing::info!(
        "Default Samples Per Pixel: {}",
        config.cache.default_samples_per_pixel
    );
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("GC Retention: {} days", config.gc.retention_days);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 8088

            [cache]
            backend = "sled"
            compress = false
            default_samples_per_pixel = 1000

            [gc]
            retention_days = 7
            "#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.backend, CacheBackend::Sled);
        assert!(!config.cache.compress);
        assert_eq!(config.cache.default_samples_per_pixel, 1000);
        assert_eq!(config.gc.retention_days, 7);
        assert_eq!(config.gc.interval_secs, 86400);
    }

    #[test]
    fn test_load_rejects_unknown_backend() {
        let file = write_config(
            r#"
            [cache]
            backend = "redis"
            "#,
        );

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_default_zoom() {
        let mut config = AppConfig::default();
        config.cache.default_samples_per_pixel = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_sled_path() {
        let mut config = AppConfig::default();
        config.cache.sled_path = String::new();
        // sqlite 后端不关心 sled_path
        assert!(validate_config(&config).is_ok());

        config.cache.backend = CacheBackend::Sled;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_gc_interval() {
        let mut config = AppConfig::default();
        config.gc.interval_secs = 0;
        assert!(validate_config(&config).is_err());

        config.gc.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_unbounded_retention() {
        let mut config = AppConfig::default();
        config.gc.retention_days = MAX_RETENTION_DAYS;
        assert!(validate_config(&config).is_ok());

        config.gc.retention_days = u32::MAX;
        assert!(validate_config(&config).is_err());
    }
}
