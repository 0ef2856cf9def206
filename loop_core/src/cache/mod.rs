//! Article cache - a bounded, insertion-ordered store of fetched articles
//! with best-effort persistence.
//!
//! The in-memory map is authoritative for the session. The persisted blob is
//! a secondary copy written after each mutation; a write failure never aborts
//! the in-memory operation, and a corrupt or version-mismatched blob is
//! discarded wholesale at startup.

mod store;

pub use store::*;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use loop_rules::ArticleTitle;

/// Schema tag of the persisted blob; a stored blob with any other tag is
/// discarded at startup.
pub const CACHE_VERSION: &str = "1.0";

/// Default bound on the number of cached keys.
pub const DEFAULT_MAX_SIZE: usize = 50;

/// Fixed key the whole cache persists under.
const STORE_KEY: &str = "wikiloop-article-cache";

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One cached article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw article markup.
    pub content: String,
    /// When the article was fetched, in milliseconds since the epoch.
    pub fetched_at: u64,
    /// When the entry was last read, in milliseconds since the epoch.
    pub last_accessed: u64,
    /// The canonical title the fetch resolved to; equals the key when the
    /// requested title was already canonical.
    pub canonical_title: ArticleTitle,
}

/// What a cache hit hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArticle {
    pub content: String,
    pub canonical_title: ArticleTitle,
}

/// On-disk shape of the cache: a version tag plus the full entry set.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    version: String,
    articles: Vec<(ArticleTitle, CacheEntry)>,
    saved_at: u64,
}

/// Insertion-ordered bounded map. Overwriting an existing key keeps its
/// original position; eviction removes the oldest-inserted key first.
#[derive(Debug, Default)]
struct CacheMap {
    entries: HashMap<ArticleTitle, CacheEntry>,
    order: VecDeque<ArticleTitle>,
}

impl CacheMap {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, title: &ArticleTitle) -> bool {
        self.entries.contains_key(title)
    }

    fn get_mut(&mut self, title: &ArticleTitle) -> Option<&mut CacheEntry> {
        self.entries.get_mut(title)
    }

    fn insert(&mut self, title: ArticleTitle, entry: CacheEntry) {
        if !self.entries.contains_key(&title) {
            self.order.push_back(title.clone());
        }
        self.entries.insert(title, entry);
    }

    fn evict_oldest(&mut self) -> Option<ArticleTitle> {
        let title = self.order.pop_front()?;
        self.entries.remove(&title);
        Some(title)
    }

    fn remove(&mut self, title: &ArticleTitle) {
        if self.entries.remove(title).is_some() {
            self.order.retain(|t| t != title);
        }
    }

    /// Entries in insertion order, cloned for persistence.
    fn snapshot(&self) -> Vec<(ArticleTitle, CacheEntry)> {
        self.order
            .iter()
            .filter_map(|t| self.entries.get(t).map(|e| (t.clone(), e.clone())))
            .collect()
    }

    fn restore(articles: Vec<(ArticleTitle, CacheEntry)>) -> Self {
        let mut map = Self::default();
        for (title, entry) in articles {
            map.insert(title, entry);
        }
        map
    }
}

/// The session's article cache.
///
/// Interior mutability keeps all methods `&self` so the cache can be shared
/// between the provider and in-flight preloads; locks are never held across
/// an await point.
pub struct ArticleCache {
    map: Mutex<CacheMap>,
    preloading: Mutex<HashSet<ArticleTitle>>,
    store: Arc<dyn CacheStore>,
    max_size: usize,
}

impl ArticleCache {
    /// Create a cache hydrated from whatever the store holds.
    ///
    /// A missing blob starts the cache empty; a corrupt or version-mismatched
    /// blob is removed from the store and likewise starts the cache empty.
    pub async fn initialize(store: Arc<dyn CacheStore>, max_size: usize) -> Self {
        let map = match store.get(STORE_KEY).await {
            None => CacheMap::default(),
            Some(bytes) => match serde_json::from_slice::<PersistedCache>(&bytes) {
                Ok(persisted) if persisted.version == CACHE_VERSION => {
                    let map = CacheMap::restore(persisted.articles);
                    info!(count = map.len(), "loaded articles from persisted cache");
                    map
                }
                Ok(persisted) => {
                    info!(
                        stored = %persisted.version,
                        expected = CACHE_VERSION,
                        "cache version mismatch, clearing persisted cache"
                    );
                    store.remove(STORE_KEY).await;
                    CacheMap::default()
                }
                Err(error) => {
                    warn!(%error, "discarding corrupt persisted cache");
                    store.remove(STORE_KEY).await;
                    CacheMap::default()
                }
            },
        };

        Self {
            map: Mutex::new(map),
            preloading: Mutex::new(HashSet::new()),
            store,
            max_size,
        }
    }

    /// Look up an article, touching its access time on a hit.
    pub async fn get(&self, title: &ArticleTitle) -> Option<CachedArticle> {
        let hit = {
            let mut map = self.map.lock();
            map.get_mut(title).map(|entry| {
                entry.last_accessed = now_millis();
                CachedArticle {
                    content: entry.content.clone(),
                    canonical_title: entry.canonical_title.clone(),
                }
            })
        };

        match hit {
            Some(article) => {
                debug!(%title, canonical = %article.canonical_title, "cache hit");
                // The access-time touch is a mutation, so the blob is synced.
                self.persist().await;
                Some(article)
            }
            None => {
                debug!(%title, "cache miss");
                None
            }
        }
    }

    /// Whether an article is cached under the given title.
    pub fn has(&self, title: &ArticleTitle) -> bool {
        self.map.lock().contains(title)
    }

    /// Insert an article under `title`, and under its canonical title too
    /// when that differs. Evicts oldest-inserted keys as needed to stay
    /// within capacity, then persists best-effort.
    pub async fn put(
        &self,
        title: ArticleTitle,
        content: String,
        canonical_title: Option<ArticleTitle>,
    ) {
        {
            let mut map = self.map.lock();
            let now = now_millis();
            let canonical = canonical_title.unwrap_or_else(|| title.clone());
            let entry = CacheEntry {
                content,
                fetched_at: now,
                last_accessed: now,
                canonical_title: canonical.clone(),
            };

            if canonical != title {
                map.insert(canonical, entry.clone());
            }
            map.insert(title, entry);

            while map.len() > self.max_size {
                if let Some(evicted) = map.evict_oldest() {
                    debug!(title = %evicted, "evicted oldest cache entry");
                } else {
                    break;
                }
            }
        }

        self.persist().await;
    }

    /// Drop the least recently accessed half of the entries (rounded down).
    pub fn evict_half_by_age(&self) {
        let mut map = self.map.lock();
        let mut by_age: Vec<(ArticleTitle, u64)> = map
            .order
            .iter()
            .filter_map(|t| map.entries.get(t).map(|e| (t.clone(), e.last_accessed)))
            .collect();
        // Stable sort: equal access times fall back to insertion order.
        by_age.sort_by_key(|(_, last_accessed)| *last_accessed);

        let to_remove = by_age.len() / 2;
        for (title, _) in by_age.into_iter().take(to_remove) {
            map.remove(&title);
        }
        info!(count = to_remove, "cleared old cache entries");
    }

    /// Number of cached keys (alias entries included).
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.map.lock().len() == 0
    }

    /// Whether a preload for this title is currently in flight.
    pub fn is_preloading(&self, title: &ArticleTitle) -> bool {
        self.preloading.lock().contains(title)
    }

    /// Mark a preload as in flight.
    ///
    /// Returns `false` - and marks nothing - when the title is already cached
    /// or already being preloaded, so each title has at most one in-flight
    /// fetch.
    pub fn begin_preload(&self, title: &ArticleTitle) -> bool {
        if self.has(title) {
            return false;
        }
        self.preloading.lock().insert(title.clone())
    }

    /// Clear the in-flight mark, whatever the preload's outcome was.
    pub fn finish_preload(&self, title: &ArticleTitle) {
        self.preloading.lock().remove(title);
    }

    /// Write the blob to the store, best-effort.
    ///
    /// A quota failure triggers a half-eviction by age and one retry; any
    /// remaining failure leaves the cache in-memory only for the session.
    async fn persist(&self) {
        let blob = self.serialize_blob();
        match self.store.set(STORE_KEY, blob).await {
            Ok(()) => {}
            Err(StoreError::QuotaExceeded) => {
                warn!("persisted cache over quota, evicting half by age");
                self.evict_half_by_age();
                let retry = self.serialize_blob();
                if let Err(error) = self.store.set(STORE_KEY, retry).await {
                    warn!(%error, "cache persistence still failing, continuing in-memory only");
                }
            }
            Err(error) => {
                warn!(%error, "failed to persist cache");
            }
        }
    }

    fn serialize_blob(&self) -> Vec<u8> {
        let persisted = PersistedCache {
            version: CACHE_VERSION.to_string(),
            articles: self.map.lock().snapshot(),
            saved_at: now_millis(),
        };
        // The blob is plain strings and integers; serialization cannot fail.
        serde_json::to_vec(&persisted).unwrap_or_default()
    }
}

impl std::fmt::Debug for ArticleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}
