use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

/// Source of "now" for expiry checks. Swapped for [`ManualClock`] in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: StdMutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: StdMutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + offset
    }
}

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// Keyed store whose entries live for a fixed TTL, holding at most `capacity`
/// entries. The least recently used entry is evicted to make room.
///
/// Entries are never invalidated early: writes to the underlying data show up
/// only once the entry expires. Two concurrent misses on the same key may both
/// compute; whichever stores last wins.
pub struct PageCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<LruCache<String, Entry<V>>>,
}

impl<V: Clone> PageCache<V> {
    pub fn new(ttl: Duration, capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The stored value for `key` if it is still within the TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let live = entries
            .get(key)
            .map(|entry| now.duration_since(entry.stored_at) < self.ttl)?;
        if !live {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: String, value: V) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.stored_at) >= self.ttl)
            .map(|(stale, _)| stale.clone())
            .collect();
        for stale in &expired {
            entries.pop(stale);
        }

        if let Some((evicted, _)) = entries.push(
            key.clone(),
            Entry {
                stored_at: now,
                value,
            },
        ) {
            if evicted != key {
                tracing::debug!("Page cache full, evicted {}", evicted);
            }
        }
    }

    /// Return the live value for `key`, or run `compute`, store and return it.
    /// The lock is not held while `compute` runs.
    pub async fn get_or_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
