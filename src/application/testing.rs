//! 测试用的端口假实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{
    AudioDecoderPort, AudioFileRecord, AudioFileResolverPort, AudioStatus, CacheError,
    DecodeError, DecodedAudio, ResolveError, ResolvedAudio, WaveformCacheEntry,
    WaveformCachePort,
};
use crate::domain::waveform::ZoomLevel;

#[derive(Default)]
pub struct FakeWaveformCache {
    entries: Mutex<HashMap<(Uuid, ZoomLevel), WaveformCacheEntry>>,
    pub fail_touch: AtomicBool,
}

impl FakeWaveformCache {
    pub fn insert_raw(&self, entry: WaveformCacheEntry) {
        self.entries
            .lock()
            .unwrap()
            .insert((entry.audio_id, entry.zoom_level), entry);
    }

    pub fn get(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Option<WaveformCacheEntry> {
        self.entries.lock().unwrap().get(&(audio_id, zoom_level)).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl WaveformCachePort for FakeWaveformCache {
    async fn find(
        &self,
        audio_id: Uuid,
        zoom_level: ZoomLevel,
    ) -> Result<Option<WaveformCacheEntry>, CacheError> {
        Ok(self.get(audio_id, zoom_level))
    }

    async fn find_by_audio(&self, audio_id: Uuid) -> Result<Vec<WaveformCacheEntry>, CacheError> {
        let mut entries: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.audio_id == audio_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.zoom_level);
        Ok(entries)
    }

    async fn upsert(&self, entry: &WaveformCacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let mut stored = entry.clone();
        if let Some(existing) = entries.get(&(entry.audio_id, entry.zoom_level)) {
            stored.id = existing.id;
            stored.created_at = existing.created_at;
        }
        entries.insert((entry.audio_id, entry.zoom_level), stored);
        Ok(())
    }

    async fn touch(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Result<(), CacheError> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(CacheError::DatabaseError("touch unavailable".to_string()));
        }
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&(audio_id, zoom_level)) {
            entry.hit_count += 1;
            entry.last_accessed_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_by_audio(
        &self,
        audio_id: Uuid,
        zoom_level: Option<ZoomLevel>,
    ) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(id, zoom), _| {
            !(*id == audio_id && zoom_level.map(|z| z == *zoom).unwrap_or(true))
        });
        Ok((before - entries.len()) as u64)
    }

    async fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, e| e.last_accessed_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub struct FakeAudioResolver {
    records: Mutex<HashMap<Uuid, AudioFileRecord>>,
    missing_files: Mutex<HashSet<Uuid>>,
}

impl FakeAudioResolver {
    pub fn register(&self, status: AudioStatus, duration: Option<f64>) -> Uuid {
        let id = Uuid::new_v4();
        self.records.lock().unwrap().insert(
            id,
            AudioFileRecord {
                id,
                storage_key: None,
                status,
                mime_type: "audio/wav".to_string(),
                duration,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn mark_file_missing(&self, audio_id: Uuid) {
        self.missing_files.lock().unwrap().insert(audio_id);
    }
}

#[async_trait]
impl AudioFileResolverPort for FakeAudioResolver {
    async fn find(&self, audio_id: Uuid) -> Result<Option<AudioFileRecord>, ResolveError> {
        Ok(self.records.lock().unwrap().get(&audio_id).cloned())
    }

    async fn resolve(&self, audio_id: Uuid) -> Result<ResolvedAudio, ResolveError> {
        let record = self
            .find(audio_id)
            .await?
            .ok_or_else(|| ResolveError::NotFound(audio_id.to_string()))?;
        if record.status != AudioStatus::Ready {
            return Err(ResolveError::NotReady {
                audio_id,
                status: record.status,
            });
        }
        if self.missing_files.lock().unwrap().contains(&audio_id) {
            return Err(ResolveError::NotFound(audio_id.to_string()));
        }
        Ok(ResolvedAudio {
            audio_id,
            file_path: PathBuf::from(format!("/fake/{}", audio_id)),
            status: record.status,
            mime_type: record.mime_type,
            duration: record.duration,
        })
    }
}

/// 返回固定 PCM 的解码器，记录调用次数
pub struct CountingDecoder {
    audio: DecodedAudio,
    calls: AtomicUsize,
    delay: Duration,
    pub fail: AtomicBool,
}

impl CountingDecoder {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            audio: DecodedAudio {
                channels,
                sample_rate,
            },
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDecoderPort for CountingDecoder {
    async fn decode(&self, _path: &Path) -> Result<DecodedAudio, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DecodeError::DecodingError("corrupt stream".to_string()));
        }
        Ok(self.audio.clone())
    }
}
