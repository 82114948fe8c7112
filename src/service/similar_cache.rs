use crate::service::types::SimilarResponse;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    value: SimilarResponse,
    stored_at: Instant,
}

struct Slots {
    lru: LruCache<(String, usize), Entry>,
    generation: u64,
}

/// Cache generation observed on a miss. An insert carrying a generation
/// older than the current one is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

pub enum Lookup {
    Hit(SimilarResponse),
    Miss(Generation),
}

/// Bounded memo of similar-products answers keyed by `(product_id, limit)`.
/// Two concurrent misses on the same key may both compute; the later insert
/// wins. Answers computed across a `clear` are discarded.
pub struct SimilarCache {
    slots: Option<Mutex<Slots>>,
    ttl: Duration,
}

impl SimilarCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let slots = NonZeroUsize::new(capacity).map(|cap| {
            Mutex::new(Slots {
                lru: LruCache::new(cap),
                generation: 0,
            })
        });
        Self { slots, ttl }
    }

    pub fn get(&self, product_id: &str, limit: usize) -> Lookup {
        let Some(slots) = &self.slots else {
            return Lookup::Miss(Generation(0));
        };
        let mut slots = slots.lock();
        let key = (product_id.to_string(), limit);
        if let Some(entry) = slots.lru.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Lookup::Hit(entry.value.clone());
            }
            slots.lru.pop(&key);
        }
        Lookup::Miss(Generation(slots.generation))
    }

    pub fn insert(
        &self,
        product_id: &str,
        limit: usize,
        seen: Generation,
        value: SimilarResponse,
    ) {
        let Some(slots) = &self.slots else {
            return;
        };
        let mut slots = slots.lock();
        if slots.generation != seen.0 {
            tracing::debug!(product_id, "dropping similar answer computed before clear");
            return;
        }
        slots.lru.put(
            (product_id.to_string(), limit),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        if let Some(slots) = &self.slots {
            let mut slots = slots.lock();
            slots.lru.clear();
            slots.generation = slots.generation.wrapping_add(1);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.as_ref().map_or(0, |s| s.lock().lru.len())
    }
}
