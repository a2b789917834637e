//! Wavecache - 波形生成与缓存服务
//!
//! - Domain: waveform/ (Bounded Context)
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use wavecache::application::WaveformCachePort;
use wavecache::config::{load_config, print_config, CacheBackend};
use wavecache::domain::waveform::ZoomLevel;
use wavecache::infrastructure::adapters::SymphoniaAudioDecoder;
use wavecache::infrastructure::http::{AppState, HttpServer, WaveformSettings};
use wavecache::infrastructure::memory::InMemoryGenerationLocks;
use wavecache::infrastructure::persistence::sled::{SledCacheConfig, SledWaveformCache};
use wavecache::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteAudioFileRegistry, SqliteWaveformCache,
};
use wavecache::infrastructure::worker::{CacheGcConfig, CacheGcWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志，RUST_LOG 优先
    let log_filter = format!(
        "{},wavecache={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Wavecache - waveform generation service");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.audio_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let registry = Arc::new(SqliteAudioFileRegistry::new(
        pool.clone(),
        config.storage.audio_dir.clone(),
    ));

    // 选择缓存后端
    let cache: Arc<dyn WaveformCachePort> = match config.cache.backend {
        CacheBackend::Sqlite => Arc::new(SqliteWaveformCache::new(pool.clone())),
        CacheBackend::Sled => Arc::new(SledWaveformCache::new(&SledCacheConfig {
            db_path: config.cache.sled_path.clone(),
        })?),
    };

    let settings = WaveformSettings {
        compress: config.cache.compress,
        default_zoom: ZoomLevel::new(config.cache.default_samples_per_pixel)?,
    };

    let state = AppState::new(
        cache,
        registry,
        Arc::new(SymphoniaAudioDecoder::new()),
        Arc::new(InMemoryGenerationLocks::new()),
        settings,
        tracing::info_span!("waveform"),
    );

    // 启动 GC Worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let gc_task = if config.gc.enabled {
        let worker = CacheGcWorker::new(
            CacheGcConfig {
                interval: Duration::from_secs(config.gc.interval_secs),
                retention_days: config.gc.retention_days,
            },
            state.cleanup_waveform_handler.clone(),
            shutdown_rx,
        );
        Some(tokio::spawn(worker.run()))
    } else {
        None
    };

    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = gc_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "CacheGcWorker exited abnormally");
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
