//! Model loading collaborator: a TTL cache owned by the host and a loader
//! wrapper that remembers failures until asked to retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use tandem_base::{CacheConfig, Result, ensure_positive};
use tandem_geometry::MeshHierarchy;

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

/// URL-keyed cache. Expired entries are evicted lazily, on the lookup that
/// finds them stale.
#[derive(Clone, Debug)]
pub struct ModelCache<T> {
    max_age: Duration,
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T: Clone> ModelCache<T> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        ensure_positive("cache max age", config.max_age_secs)?;
        Ok(Self::new(Duration::from_secs_f64(config.max_age_secs)))
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, url: &str) -> Option<T> {
        self.get_at(url, Instant::now())
    }

    pub fn set(&mut self, url: impl Into<String>, value: T) {
        self.set_at(url, value, Instant::now());
    }

    pub fn get_at(&mut self, url: &str, now: Instant) -> Option<T> {
        let entry = self.entries.get(url)?;
        if now.saturating_duration_since(entry.stored_at) > self.max_age {
            self.entries.remove(url);
            debug!(url, "cache entry expired");
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set_at(&mut self, url: impl Into<String>, value: T, now: Instant) {
        self.entries.insert(
            url.into(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    pub fn remove(&mut self, url: &str) -> Option<T> {
        self.entries.remove(url).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Fetches a mesh hierarchy for a URL.
pub trait ModelLoader {
    fn load(&mut self, url: &str) -> Result<MeshHierarchy>;
}

impl<F> ModelLoader for F
where
    F: FnMut(&str) -> Result<MeshHierarchy>,
{
    fn load(&mut self, url: &str) -> Result<MeshHierarchy> {
        self(url)
    }
}

/// Outcome of a cached load. A failed URL renders as a placeholder.
#[derive(Clone, Debug)]
pub enum LoadState {
    Ready(Arc<MeshHierarchy>),
    Placeholder { url: String, reason: String },
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    pub fn mesh(&self) -> Option<&Arc<MeshHierarchy>> {
        match self {
            LoadState::Ready(mesh) => Some(mesh),
            LoadState::Placeholder { .. } => None,
        }
    }
}

pub struct CachedLoader<L> {
    loader: L,
    cache: ModelCache<Arc<MeshHierarchy>>,
    failures: HashMap<String, String>,
    loads: usize,
}

impl<L: ModelLoader> CachedLoader<L> {
    pub fn new(loader: L, cache: ModelCache<Arc<MeshHierarchy>>) -> Self {
        Self {
            loader,
            cache,
            failures: HashMap::new(),
            loads: 0,
        }
    }

    pub fn cache(&self) -> &ModelCache<Arc<MeshHierarchy>> {
        &self.cache
    }

    /// Calls that reached the underlying loader.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failures.contains_key(url)
    }

    pub fn fetch(&mut self, url: &str) -> LoadState {
        self.fetch_at(url, Instant::now())
    }

    /// Cached hierarchy, or a fresh load. A URL that failed before stays a
    /// placeholder without another load attempt.
    pub fn fetch_at(&mut self, url: &str, now: Instant) -> LoadState {
        if let Some(mesh) = self.cache.get_at(url, now) {
            return LoadState::Ready(mesh);
        }
        if let Some(reason) = self.failures.get(url) {
            return LoadState::Placeholder {
                url: url.to_string(),
                reason: reason.clone(),
            };
        }
        self.loads += 1;
        match self.loader.load(url) {
            Ok(mesh) => {
                let mesh = Arc::new(mesh);
                self.cache.set_at(url, Arc::clone(&mesh), now);
                LoadState::Ready(mesh)
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(url, error = %reason, "model load failed; showing placeholder");
                self.failures.insert(url.to_string(), reason.clone());
                LoadState::Placeholder {
                    url: url.to_string(),
                    reason,
                }
            }
        }
    }

    /// Forgets a remembered failure and loads again.
    pub fn retry(&mut self, url: &str) -> LoadState {
        self.failures.remove(url);
        self.fetch(url)
    }
}
