//! Render cache for converted Markdown
//!
//! Content files do not change while the server runs, so a rendered page is
//! kept for the lifetime of the process and never invalidated. Two callers
//! rendering the same identifier for the first time may both compute it;
//! the value is deterministic, so whichever insert lands last is as good as
//! the first.

use dashmap::DashMap;
use std::sync::Arc;

use crate::error::Result;

/// Get-or-compute access to rendered HTML, keyed by content identifier
pub trait RenderCache: Send + Sync {
    /// Return the cached value for `key`, computing and storing it on a miss.
    /// Failed computations are not cached.
    fn get_or_compute(&self, key: &str, compute: &dyn Fn() -> Result<String>)
        -> Result<Arc<str>>;

    /// Number of cached entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime cache backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Arc<str>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderCache for MemoryCache {
    fn get_or_compute(
        &self,
        key: &str,
        compute: &dyn Fn() -> Result<String>,
    ) -> Result<Arc<str>> {
        if let Some(hit) = self.entries.get(key) {
            return Ok(Arc::clone(hit.value()));
        }

        // Computed outside the map lock; a racing writer just overwrites
        // with the same value.
        tracing::debug!("Render cache miss: {}", key);
        let value: Arc<str> = Arc::from(compute()?);
        self.entries.insert(key.to_string(), Arc::clone(&value));
        Ok(value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Pass-through cache that recomputes on every call.
///
/// Used while editing content so changes show up without a restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl RenderCache for NoCache {
    fn get_or_compute(
        &self,
        _key: &str,
        compute: &dyn Fn() -> Result<String>,
    ) -> Result<Arc<str>> {
        Ok(Arc::from(compute()?))
    }

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_memory_cache_computes_once() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || -> Result<String> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("<p>home</p>".to_string())
        };

        let first = cache.get_or_compute("home", &compute).unwrap();
        let second = cache.get_or_compute("home", &compute).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_memory_cache_does_not_store_errors() {
        let cache = MemoryCache::new();
        let result = cache.get_or_compute("missing", &|| Err(SiteError::not_found("missing")));
        assert!(result.unwrap_err().is_not_found());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memory_cache_concurrent_first_access() {
        let cache = Arc::new(MemoryCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_compute("shared", &|| Ok("same value".to_string()))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(&*handle.join().unwrap(), "same value");
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_no_cache_recomputes() {
        let cache = NoCache;
        let calls = AtomicUsize::new(0);
        let compute = || -> Result<String> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("x".to_string())
        };
        cache.get_or_compute("a", &compute).unwrap();
        cache.get_or_compute("a", &compute).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
