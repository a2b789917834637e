//! Generation Lock Port - 波形生成互斥
//!
//! 同一 (audio_id, zoom_level) 的并发缓存未命中只允许一个请求解码，
//! 其余请求等待后直接读取缓存

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::waveform::ZoomLevel;

/// 持有期间独占该键的生成权，Drop 时释放
pub trait GenerationGuard: Send {}

#[async_trait]
pub trait GenerationLockPort: Send + Sync {
    async fn acquire(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Box<dyn GenerationGuard>;

    /// 当前被占用或等待中的键数量
    fn in_flight(&self) -> usize;
}
