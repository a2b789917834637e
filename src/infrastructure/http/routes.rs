//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                              GET     健康检查
//! - /api/audio/:audio_id/waveform          GET     获取波形（?samplesPerPixel=N）
//! - /api/audio/:audio_id/waveform          DELETE  清除波形缓存（可选 samplesPerPixel）
//! - /api/audio/:audio_id/waveform/stats    GET     三档缓存状态
//! - /api/waveform/cleanup                  POST    清理长期未访问的缓存

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/audio", audio_routes())
        .route("/waveform/cleanup", post(handlers::cleanup_waveforms))
}

/// Audio 路由
fn audio_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/:audio_id/waveform",
            get(handlers::get_waveform).delete(handlers::clear_waveform),
        )
        .route("/:audio_id/waveform/stats", get(handlers::get_waveform_stats))
}
