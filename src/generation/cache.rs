//! Result cache for full-deck generations
//!
//! Bounded, time-expiring store keyed by the normalized request fingerprint.
//! Expiry is lazy (checked at read time) and eviction is FIFO by insertion
//! order: reads never refresh an entry's position.

use crate::config::CacheConfig;
use crate::generation::types::{Deck, Fingerprint};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// One cached deck with its insertion timestamp
#[derive(Debug)]
struct CacheEntry {
    deck: Deck,
    inserted_at: Instant,
}

/// Map plus insertion-order queue, guarded together
#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    order: VecDeque<Fingerprint>,
}

/// Bounded, expiring deck cache for the full-deck path
///
/// Safe under concurrent `get`/`put` from multiple in-flight requests. The
/// lock is never held across an await point.
#[derive(Debug)]
pub struct DeckCache {
    enabled: bool,
    ttl: Duration,
    max_size: usize,
    inner: Mutex<CacheInner>,
}

impl DeckCache {
    /// Create a cache from configuration
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled && config.max_size > 0,
            ttl: Duration::from_secs(config.ttl_secs),
            max_size: config.max_size,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    #[cfg(test)]
    fn with_ttl(ttl: Duration, max_size: usize) -> Self {
        Self {
            enabled: true,
            ttl,
            max_size,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Look up a live entry; expired entries are treated as absent and removed
    pub async fn get(&self, key: &Fingerprint) -> Option<Deck> {
        if !self.enabled {
            return None;
        }

        let mut inner = self.inner.lock().await;
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };

        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            debug!("Cache entry expired");
            return None;
        }

        inner.entries.get(key).map(|entry| entry.deck.clone())
    }

    /// Insert or overwrite an entry
    ///
    /// Overwriting refreshes the entry's insertion position. When a new key
    /// arrives at capacity, expired entries are purged first; if the cache is
    /// still full, the single oldest-inserted live entry is evicted.
    pub async fn put(&self, key: Fingerprint, deck: Deck) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock().await;

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.max_size {
            let CacheInner { entries, order } = &mut *inner;
            entries.retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
            order.retain(|k| entries.contains_key(k));

            while entries.len() >= self.max_size {
                match order.pop_front() {
                    Some(oldest) => {
                        entries.remove(&oldest);
                        debug!("Evicted oldest cache entry");
                    }
                    None => break,
                }
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                deck,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
    }

    /// Number of stored entries, including not-yet-collected expired ones
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::{DeckRequest, Slide, SlideKind};

    fn key(topic: &str) -> Fingerprint {
        DeckRequest {
            topic: topic.to_string(),
            grade: "4th grade".to_string(),
            context: String::new(),
            slide_count: 4,
        }
        .fingerprint()
    }

    fn deck(title: &str) -> Deck {
        vec![Slide {
            kind: SlideKind::Title,
            title: title.to_string(),
            body: "body".to_string(),
            image: None,
            question: None,
        }]
    }

    #[tokio::test]
    async fn test_put_then_get_returns_deck() {
        let cache = DeckCache::with_ttl(Duration::from_secs(60), 10);
        cache.put(key("a"), deck("A")).await;

        let hit = cache.get(&key("a")).await.expect("entry should be live");
        assert_eq!(hit[0].title, "A");
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let cache = DeckCache::new(&CacheConfig {
            enabled: false,
            ttl_secs: 60,
            max_size: 10,
        });

        cache.put(key("a"), deck("A")).await;
        assert!(cache.get(&key("a")).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_misses_and_is_removed() {
        let cache = DeckCache::with_ttl(Duration::from_millis(10), 10);
        cache.put(key("a"), deck("A")).await;
        assert_eq!(cache.len().await, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(&key("a")).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_fifo_eviction_removes_oldest() {
        let cache = DeckCache::with_ttl(Duration::from_secs(60), 2);
        cache.put(key("a"), deck("A")).await;
        cache.put(key("b"), deck("B")).await;
        cache.put(key("c"), deck("C")).await;

        assert!(cache.get(&key("a")).await.is_none());
        assert!(cache.get(&key("b")).await.is_some());
        assert!(cache.get(&key("c")).await.is_some());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_does_not_refresh_eviction_order() {
        let cache = DeckCache::with_ttl(Duration::from_secs(60), 2);
        cache.put(key("a"), deck("A")).await;
        cache.put(key("b"), deck("B")).await;

        // A read of the oldest entry must not save it from eviction.
        assert!(cache.get(&key("a")).await.is_some());
        cache.put(key("c"), deck("C")).await;

        assert!(cache.get(&key("a")).await.is_none());
        assert!(cache.get(&key("b")).await.is_some());
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_insertion_order() {
        let cache = DeckCache::with_ttl(Duration::from_secs(60), 2);
        cache.put(key("a"), deck("A")).await;
        cache.put(key("b"), deck("B")).await;
        cache.put(key("a"), deck("A2")).await;
        cache.put(key("c"), deck("C")).await;

        assert!(cache.get(&key("b")).await.is_none());
        let a = cache.get(&key("a")).await.expect("overwritten entry stays");
        assert_eq!(a[0].title, "A2");
    }

    #[tokio::test]
    async fn test_expired_entries_purged_before_evicting_live() {
        let cache = DeckCache::with_ttl(Duration::from_millis(10), 2);
        cache.put(key("a"), deck("A")).await;
        cache.put(key("b"), deck("B")).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.put(key("c"), deck("C")).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key("c")).await.is_some());
    }
}
