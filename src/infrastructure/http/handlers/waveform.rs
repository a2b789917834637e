//! Waveform Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CleanupWaveformCache, ClearWaveformCache, GetWaveformQuery, GetWaveformStatsQuery,
    DEFAULT_RETENTION_DAYS,
};
use crate::domain::waveform::ZoomLevel;
use crate::infrastructure::http::dto::{
    ApiResponse, CleanupRequest, RemovedDto, WaveformDto, WaveformParams, WaveformStatsDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn audio_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid audio id: {}", e)))
}

fn params(query: Result<Query<WaveformParams>, QueryRejection>) -> Result<WaveformParams, ApiError> {
    query
        .map(|Query(p)| p)
        .map_err(|e| ApiError::BadRequest(format!("Invalid query: {}", e)))
}

fn parse_zoom(samples_per_pixel: u32) -> Result<ZoomLevel, ApiError> {
    ZoomLevel::new(samples_per_pixel).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GET /api/audio/:audio_id/waveform
pub async fn get_waveform(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<WaveformParams>, QueryRejection>,
) -> Result<Json<ApiResponse<WaveformDto>>, ApiError> {
    let audio_id = audio_id(path)?;
    let zoom_level = match params(query)?.samples_per_pixel {
        Some(spp) => parse_zoom(spp)?,
        None => state.settings.default_zoom,
    };

    let result = state
        .get_waveform_handler
        .handle(GetWaveformQuery {
            audio_id,
            zoom_level,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// GET /api/audio/:audio_id/waveform/stats
pub async fn get_waveform_stats(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<WaveformStatsDto>>, ApiError> {
    let audio_id = audio_id(path)?;

    let result = state
        .get_waveform_stats_handler
        .handle(GetWaveformStatsQuery { audio_id })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// DELETE /api/audio/:audio_id/waveform
///
/// 未指定 samplesPerPixel 时清除全部缩放级别
pub async fn clear_waveform(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<WaveformParams>, QueryRejection>,
) -> Result<Json<ApiResponse<RemovedDto>>, ApiError> {
    let audio_id = audio_id(path)?;
    let zoom_level = params(query)?
        .samples_per_pixel
        .map(parse_zoom)
        .transpose()?;

    let removed = state
        .clear_waveform_handler
        .handle(ClearWaveformCache {
            audio_id,
            zoom_level,
        })
        .await?;

    Ok(Json(ApiResponse::success(RemovedDto { removed })))
}

/// 未携带 JSON 请求体时使用默认保留天数，其余解析失败均为 400
fn cleanup_request(
    body: Result<Json<CleanupRequest>, JsonRejection>,
) -> Result<CleanupRequest, ApiError> {
    match body {
        Ok(Json(req)) => Ok(req),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(CleanupRequest::default()),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid request body: {}", e))),
    }
}

/// POST /api/waveform/cleanup
pub async fn cleanup_waveforms(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CleanupRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RemovedDto>>, ApiError> {
    let retention_days = cleanup_request(body)?
        .days
        .unwrap_or(DEFAULT_RETENTION_DAYS);

    let removed = state
        .cleanup_waveform_handler
        .handle(CleanupWaveformCache { retention_days })
        .await?;

    Ok(Json(ApiResponse::success(RemovedDto { removed })))
}
