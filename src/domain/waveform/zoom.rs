//! Waveform Context - Value Objects

use serde::{Deserialize, Serialize};

use super::WaveformError;

/// 缩放级别（每像素对应的采样点数）
///
/// 数值越小越精细，生成的包络越长
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ZoomLevel(u32);

impl ZoomLevel {
    /// 概览级 - 每像素 1000 采样点
    pub const OVERVIEW: ZoomLevel = ZoomLevel(1000);
    /// 详细级 - 每像素 100 采样点
    pub const DETAIL: ZoomLevel = ZoomLevel(100);
    /// 缩放级 - 每像素 10 采样点
    pub const ZOOM: ZoomLevel = ZoomLevel(10);

    pub fn new(samples_per_pixel: u32) -> Result<Self, WaveformError> {
        if samples_per_pixel == 0 {
            return Err(WaveformError::InvalidZoomLevel(samples_per_pixel));
        }
        Ok(Self(samples_per_pixel))
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.0
    }

    /// 对应的命名档位（非三档之一时返回 None）
    pub fn tier(&self) -> Option<ZoomTier> {
        ZoomTier::ALL
            .into_iter()
            .find(|tier| tier.zoom_level() == *self)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::DETAIL
    }
}

impl TryFrom<u32> for ZoomLevel {
    type Error = WaveformError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoomLevel> for u32 {
    fn from(zoom: ZoomLevel) -> Self {
        zoom.0
    }
}

impl std::fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 统计报告使用的三个固定档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomTier {
    Overview,
    Detail,
    Zoom,
}

impl ZoomTier {
    pub const ALL: [ZoomTier; 3] = [ZoomTier::Overview, ZoomTier::Detail, ZoomTier::Zoom];

    pub fn zoom_level(&self) -> ZoomLevel {
        match self {
            ZoomTier::Overview => ZoomLevel::OVERVIEW,
            ZoomTier::Detail => ZoomLevel::DETAIL,
            ZoomTier::Zoom => ZoomLevel::ZOOM,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomTier::Overview => "overview",
            ZoomTier::Detail => "detail",
            ZoomTier::Zoom => "zoom",
        }
    }
}
