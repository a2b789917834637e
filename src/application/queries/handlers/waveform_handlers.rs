//! Waveform Query Handlers
//!
//! 波形获取流程：
//! 1. 查询缓存（命中 → 更新访问统计 → 解码负载返回）
//! 2. 未命中 → 定位音频文件 → 解码 → 归约 → 压缩 → 写入缓存 → 返回

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioDecoderPort, AudioFileResolverPort, DecodeError, GenerationLockPort,
    NewWaveformCacheEntry, WaveformCacheEntry, WaveformCachePort,
};
use crate::application::queries::waveform_queries::{
    GetWaveformQuery, GetWaveformResponse, GetWaveformStatsQuery, TierCacheStatus,
    WaveformStatsResponse,
};
use crate::domain::waveform::{decode_payload, encode_payload, reduce, ZoomLevel, ZoomTier};

// ============================================================================
// GetWaveform
// ============================================================================

/// GetWaveform Handler - 获取（必要时生成）波形数据
pub struct GetWaveformHandler {
    cache: Arc<dyn WaveformCachePort>,
    resolver: Arc<dyn AudioFileResolverPort>,
    decoder: Arc<dyn AudioDecoderPort>,
    locks: Arc<dyn GenerationLockPort>,
    /// 新生成的负载是否压缩
    compress: bool,
    span: Span,
}

impl GetWaveformHandler {
    pub fn new(
        cache: Arc<dyn WaveformCachePort>,
        resolver: Arc<dyn AudioFileResolverPort>,
        decoder: Arc<dyn AudioDecoderPort>,
        locks: Arc<dyn GenerationLockPort>,
        compress: bool,
        span: Span,
    ) -> Self {
        Self {
            cache,
            resolver,
            decoder,
            locks,
            compress,
            span,
        }
    }

    pub async fn handle(
        &self,
        query: GetWaveformQuery,
    ) -> Result<GetWaveformResponse, ApplicationError> {
        let span = tracing::info_span!(
            parent: &self.span,
            "get_waveform",
            audio_id = %query.audio_id,
            samples_per_pixel = query.zoom_level.samples_per_pixel(),
        );

        async move {
            if let Some(hit) = self.lookup(query.audio_id, query.zoom_level).await? {
                return Ok(hit);
            }

            let _guard = self.locks.acquire(query.audio_id, query.zoom_level).await;

            // 等待锁期间可能已由其他请求生成
            if let Some(hit) = self.lookup(query.audio_id, query.zoom_level).await? {
                return Ok(hit);
            }

            self.generate(query.audio_id, query.zoom_level).await
        }
        .instrument(span)
        .await
    }

    /// 缓存查询，损坏的条目会被删除并按未命中处理
    async fn lookup(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<Option<GetWaveformResponse>, ApplicationError> {
        let Some(entry) = self.cache.find(audio_id, zoom_level).await? else {
            tracing::debug!("Waveform cache miss");
            return Ok(None);
        };

        // 访问统计只是尽力而为
        if let Err(e) = self.cache.touch(audio_id, zoom_level).await {
            tracing::warn!(error = %e, "Failed to update waveform cache access stats");
        }

        let envelope = match decode_payload(&entry.payload, entry.is_compressed) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    entry_id = %entry.id,
                    "Corrupt waveform cache entry, regenerating"
                );
                self.cache.delete_by_audio(audio_id, Some(zoom_level)).await?;
                return Ok(None);
            }
        };

        tracing::info!(
            hit_count = entry.hit_count + 1,
            points = envelope.len(),
            "Waveform served from cache"
        );

        Ok(Some(GetWaveformResponse {
            audio_id,
            envelope,
            zoom_level,
            duration: entry.duration,
            sample_rate: entry.sample_rate,
            channel_count: entry.channel_count,
            from_cache: true,
            generated_at: entry.updated_at,
        }))
    }

    async fn generate(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<GetWaveformResponse, ApplicationError> {
        let resolved = self.resolver.resolve(audio_id).await?;

        let decoded = self.decoder.decode(&resolved.file_path).await?;
        if decoded.frame_count() == 0 {
            return Err(DecodeError::EmptyStream.into());
        }

        let envelope = reduce(&decoded.channels, zoom_level);
        let payload = encode_payload(&envelope, self.compress)?;

        let duration = resolved.duration.unwrap_or_else(|| decoded.duration_secs());
        let now = Utc::now();
        let entry = WaveformCacheEntry::generated(
            NewWaveformCacheEntry {
                audio_id,
                zoom_level,
                payload,
                is_compressed: self.compress,
                duration,
                sample_rate: decoded.sample_rate,
                channel_count: decoded.channel_count(),
            },
            now,
        );

        self.cache.upsert(&entry).await?;

        tracing::info!(
            points = envelope.len(),
            payload_size_bytes = entry.payload_size_bytes,
            sample_rate = decoded.sample_rate,
            channels = decoded.channel_count(),
            "Waveform generated and cached"
        );

        Ok(GetWaveformResponse {
            audio_id,
            envelope,
            zoom_level,
            duration,
            sample_rate: decoded.sample_rate,
            channel_count: decoded.channel_count(),
            from_cache: false,
            generated_at: now,
        })
    }
}

// ============================================================================
// GetWaveformStats
// ============================================================================

/// GetWaveformStats Handler - 查询三档缓存状态
pub struct GetWaveformStatsHandler {
    cache: Arc<dyn WaveformCachePort>,
    resolver: Arc<dyn AudioFileResolverPort>,
    span: Span,
}

impl GetWaveformStatsHandler {
    pub fn new(
        cache: Arc<dyn WaveformCachePort>,
        resolver: Arc<dyn AudioFileResolverPort>,
        span: Span,
    ) -> Self {
        Self {
            cache,
            resolver,
            span,
        }
    }

    pub async fn handle(
        &self,
        query: GetWaveformStatsQuery,
    ) -> Result<WaveformStatsResponse, ApplicationError> {
        let span = tracing::info_span!(
            parent: &self.span,
            "get_waveform_stats",
            audio_id = %query.audio_id,
        );

        async move {
            let audio = self
                .resolver
                .find(query.audio_id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("Audio file", query.audio_id))?;

            let entries = self.cache.find_by_audio(query.audio_id).await?;

            let mut cache_status = TierCacheStatus::default();
            for entry in &entries {
                match entry.zoom_level.tier() {
                    Some(ZoomTier::Overview) => cache_status.overview = true,
                    Some(ZoomTier::Detail) => cache_status.detail = true,
                    Some(ZoomTier::Zoom) => cache_status.zoom = true,
                    None => {}
                }
            }

            let last_updated_at = entries
                .iter()
                .map(|e| e.updated_at)
                .max()
                .unwrap_or(DateTime::<Utc>::from(std::time::UNIX_EPOCH));

            tracing::debug!(cached_levels = entries.len(), "Waveform stats collected");

            Ok(WaveformStatsResponse {
                audio_id: query.audio_id,
                cache_status,
                duration: audio
                    .duration
                    .or_else(|| entries.first().map(|e| e.duration)),
                last_updated_at,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::application::ports::{cache_timestamp, AudioStatus};
    use crate::application::testing::{CountingDecoder, FakeAudioResolver, FakeWaveformCache};
    use crate::domain::waveform::{compress, Envelope, Peak};
    use crate::infrastructure::memory::InMemoryGenerationLocks;

    struct Fixture {
        cache: Arc<FakeWaveformCache>,
        resolver: Arc<FakeAudioResolver>,
        decoder: Arc<CountingDecoder>,
        handler: GetWaveformHandler,
    }

    fn fixture_with(decoder: CountingDecoder, compress: bool) -> Fixture {
        let cache = Arc::new(FakeWaveformCache::default());
        let resolver = Arc::new(FakeAudioResolver::default());
        let decoder = Arc::new(decoder);
        let handler = GetWaveformHandler::new(
            cache.clone(),
            resolver.clone(),
            decoder.clone(),
            Arc::new(InMemoryGenerationLocks::new()),
            compress,
            Span::none(),
        );
        Fixture {
            cache,
            resolver,
            decoder,
            handler,
        }
    }

    fn three_block_samples() -> Vec<f32> {
        let mut samples = vec![1.0f32; 1000];
        samples.extend(vec![-1.0f32; 1000]);
        samples.extend(vec![0.5f32; 200]);
        samples
    }

    fn fixture() -> Fixture {
        fixture_with(CountingDecoder::new(vec![three_block_samples()], 44100), true)
    }

    fn query(audio_id: Uuid, spp: u32) -> GetWaveformQuery {
        GetWaveformQuery {
            audio_id,
            zoom_level: ZoomLevel::new(spp).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, Some(12.5));

        let first = f.handler.handle(query(audio_id, 1000)).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(
            first.envelope.peaks(),
            &[Peak::new(1.0, 1.0), Peak::new(-1.0, -1.0), Peak::new(0.5, 0.5)]
        );
        assert_eq!(first.duration, 12.5);
        assert_eq!(first.sample_rate, 44100);
        assert_eq!(first.channel_count, 1);

        let second = f.handler.handle(query(audio_id, 1000)).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.envelope, first.envelope);
        assert_eq!(f.decoder.calls(), 1);

        let entry = f.cache.get(audio_id, ZoomLevel::OVERVIEW).unwrap();
        assert_eq!(entry.hit_count, 2);
        assert!(entry.is_compressed);
        assert_eq!(second.generated_at, entry.updated_at);
    }

    #[tokio::test]
    async fn test_default_zoom_produces_ceil_points() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, None);

        let response = f
            .handler
            .handle(GetWaveformQuery {
                audio_id,
                zoom_level: ZoomLevel::default(),
            })
            .await
            .unwrap();

        assert_eq!(response.envelope.len(), 22);
        // 没有登记时长时由解码结果推算
        assert!((response.duration - 2200.0 / 44100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_audio_is_not_found() {
        let f = fixture();
        let err = f.handler.handle(query(Uuid::new_v4(), 100)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
        assert_eq!(f.decoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, None);
        f.resolver.mark_file_missing(audio_id);

        let err = f.handler.handle(query(audio_id, 100)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_not_ready_audio() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Uploading, None);

        let err = f.handler.handle(query(audio_id, 100)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotReady(_)));
        assert_eq!(f.cache.len(), 0);
    }

    #[tokio::test]
    async fn test_decode_error_propagates_without_caching() {
        let f = fixture();
        f.decoder.fail.store(true, Ordering::SeqCst);
        let audio_id = f.resolver.register(AudioStatus::Ready, None);

        let err = f.handler.handle(query(audio_id, 100)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::DecodeError(_)));
        assert_eq!(f.cache.len(), 0);
    }

    #[tokio::test]
    async fn test_empty_decode_is_error() {
        let f = fixture_with(CountingDecoder::new(vec![Vec::new()], 44100), true);
        let audio_id = f.resolver.register(AudioStatus::Ready, None);

        let err = f.handler.handle(query(audio_id, 100)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::DecodeError(_)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_regenerated() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, None);
        let zoom = ZoomLevel::OVERVIEW;

        let mut entry = WaveformCacheEntry::generated(
            NewWaveformCacheEntry {
                audio_id,
                zoom_level: zoom,
                payload: b"garbage".to_vec(),
                is_compressed: true,
                duration: 1.0,
                sample_rate: 8000,
                channel_count: 1,
            },
            Utc::now(),
        );
        entry.hit_count = 40;
        f.cache.insert_raw(entry);

        let response = f.handler.handle(query(audio_id, 1000)).await.unwrap();
        assert!(!response.from_cache);
        assert_eq!(response.envelope.len(), 3);
        assert_eq!(f.cache.get(audio_id, zoom).unwrap().hit_count, 1);
    }

    #[tokio::test]
    async fn test_legacy_uncompressed_entry_is_served() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, None);
        f.cache.insert_raw(WaveformCacheEntry::generated(
            NewWaveformCacheEntry {
                audio_id,
                zoom_level: ZoomLevel::DETAIL,
                payload: b"[-0.25,0.75]".to_vec(),
                is_compressed: false,
                duration: 3.0,
                sample_rate: 22050,
                channel_count: 2,
            },
            Utc::now(),
        ));

        let response = f.handler.handle(query(audio_id, 100)).await.unwrap();
        assert!(response.from_cache);
        assert_eq!(response.envelope.peaks(), &[Peak::new(-0.25, 0.75)]);
        assert_eq!(response.channel_count, 2);
        assert_eq!(f.decoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_touch_failure_does_not_block_hit() {
        let f = fixture();
        let audio_id = f.resolver.register(AudioStatus::Ready, None);
        f.handler.handle(query(audio_id, 100)).await.unwrap();

        f.cache.fail_touch.store(true, Ordering::SeqCst);
        let response = f.handler.handle(query(audio_id, 100)).await.unwrap();
        assert!(response.from_cache);
    }

    #[tokio::test]
    async fn test_uncompressed_mode_stores_plain_json() {
        let f = fixture_with(CountingDecoder::new(vec![three_block_samples()], 44100), false);
        let audio_id = f.resolver.register(AudioStatus::Ready, None);

        f.handler.handle(query(audio_id, 1000)).await.unwrap();

        let entry = f.cache.get(audio_id, ZoomLevel::OVERVIEW).unwrap();
        assert!(!entry.is_compressed);
        assert_eq!(entry.payload, b"[1.0,1.0,-1.0,-1.0,0.5,0.5]".to_vec());
    }

    #[tokio::test]
    async fn test_concurrent_misses_decode_once() {
        let f = fixture_with(
            CountingDecoder::new(vec![three_block_samples()], 44100)
                .with_delay(Duration::from_millis(50)),
            true,
        );
        let audio_id = f.resolver.register(AudioStatus::Ready, None);
        let handler = Arc::new(f.handler);

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move { handler.handle(query(audio_id, 10)).await })
            })
            .collect();

        let mut from_cache = 0;
        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert_eq!(response.envelope.len(), 220);
            if response.from_cache {
                from_cache += 1;
            }
        }

        assert_eq!(f.decoder.calls(), 1);
        assert_eq!(from_cache, 3);
    }

    #[tokio::test]
    async fn test_stats_reports_tiers() {
        let cache = Arc::new(FakeWaveformCache::default());
        let resolver = Arc::new(FakeAudioResolver::default());
        let audio_id = resolver.register(AudioStatus::Ready, Some(90.0));
        let handler = GetWaveformStatsHandler::new(cache.clone(), resolver.clone(), Span::none());

        let empty = handler
            .handle(GetWaveformStatsQuery { audio_id })
            .await
            .unwrap();
        assert_eq!(empty.cache_status, TierCacheStatus::default());
        assert_eq!(empty.last_updated_at, DateTime::<Utc>::from(std::time::UNIX_EPOCH));

        let updated_at = cache_timestamp(Utc::now());
        cache.insert_raw(WaveformCacheEntry::generated(
            NewWaveformCacheEntry {
                audio_id,
                zoom_level: ZoomLevel::DETAIL,
                payload: compress(&Envelope::default()).unwrap(),
                is_compressed: true,
                duration: 90.0,
                sample_rate: 48000,
                channel_count: 2,
            },
            updated_at,
        ));

        let stats = handler
            .handle(GetWaveformStatsQuery { audio_id })
            .await
            .unwrap();
        assert_eq!(
            stats.cache_status,
            TierCacheStatus {
                overview: false,
                detail: true,
                zoom: false,
            }
        );
        assert_eq!(stats.duration, Some(90.0));
        assert_eq!(stats.last_updated_at, updated_at);
    }

    #[tokio::test]
    async fn test_stats_unknown_audio() {
        let handler = GetWaveformStatsHandler::new(
            Arc::new(FakeWaveformCache::default()),
            Arc::new(FakeAudioResolver::default()),
            Span::none(),
        );
        let err = handler
            .handle(GetWaveformStatsQuery {
                audio_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }
}
