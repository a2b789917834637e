//! In-Memory Generation Locks
//!
//! 每个 (audio_id, zoom_level) 一把异步互斥锁，最后一个持有者释放后移除

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::application::ports::{GenerationGuard, GenerationLockPort};
use crate::domain::waveform::ZoomLevel;

type LockKey = (Uuid, ZoomLevel);
type LockTable = DashMap<LockKey, Arc<Mutex<()>>>;

/// 内存生成锁表
#[derive(Default)]
pub struct InMemoryGenerationLocks {
    locks: Arc<LockTable>,
}

impl InMemoryGenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }
}

struct InMemoryGenerationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    key: LockKey,
}

impl GenerationGuard for InMemoryGenerationGuard {}

impl Drop for InMemoryGenerationGuard {
    fn drop(&mut self) {
        // 先释放锁，之后表中引用只剩 map 自身时才移除
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[async_trait]
impl GenerationLockPort for InMemoryGenerationLocks {
    async fn acquire(&self, audio_id: Uuid, zoom_level: ZoomLevel) -> Box<dyn GenerationGuard> {
        let key = (audio_id, zoom_level);
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;

        Box::new(InMemoryGenerationGuard {
            guard: Some(guard),
            locks: self.locks.clone(),
            key,
        })
    }

    fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_released_and_removed_on_drop() {
        let locks = InMemoryGenerationLocks::new();
        let audio_id = Uuid::new_v4();

        let guard = locks.acquire(audio_id, ZoomLevel::DETAIL).await;
        assert_eq!(locks.in_flight(), 1);
        drop(guard);
        assert_eq!(locks.in_flight(), 0);

        // 可再次获取
        let _guard = locks.acquire(audio_id, ZoomLevel::DETAIL).await;
        assert_eq!(locks.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = InMemoryGenerationLocks::new();
        let audio_id = Uuid::new_v4();

        let _detail = locks.acquire(audio_id, ZoomLevel::DETAIL).await;
        let zoom = tokio::time::timeout(
            Duration::from_millis(200),
            locks.acquire(audio_id, ZoomLevel::ZOOM),
        )
        .await;

        assert!(zoom.is_ok());
        assert_eq!(locks.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(InMemoryGenerationLocks::new());
        let audio_id = Uuid::new_v4();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let active = active.clone();
            let max_active = max_active.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(audio_id, ZoomLevel::OVERVIEW).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(locks.in_flight(), 0);
    }
}
