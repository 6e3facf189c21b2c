//! Collection caches
//!
//! Works and exhibitions are read on nearly every page, so the first
//! successful fetch of each is kept and reused. A fetch that finishes after
//! the slot was filled gets the stored collection back and is discarded. The default
//! [`ProcessCache`] never expires: CMS edits made outside the admin routes
//! stay invisible until restart. [`TtlCache`] bounds that staleness.
//!
//! Locks are `std::sync::RwLock` and are never held across an await.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Single-slot cache for one fetched collection
pub trait CollectionCache<T>: Send + Sync {
    fn get(&self) -> Option<Arc<Vec<T>>>;

    /// Store `items` unless a live collection is already cached
    ///
    /// Returns whichever collection the slot holds afterwards.
    fn get_or_set(&self, items: Arc<Vec<T>>) -> Arc<Vec<T>>;

    fn clear(&self);
}

/// Keeps the collection for the process lifetime
pub struct ProcessCache<T> {
    slot: RwLock<Option<Arc<Vec<T>>>>,
}

impl<T> ProcessCache<T> {
    pub fn new() -> Self {
        Self { slot: RwLock::new(None) }
    }
}

impl<T> Default for ProcessCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> CollectionCache<T> for ProcessCache<T> {
    fn get(&self) -> Option<Arc<Vec<T>>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn get_or_set(&self, items: Arc<Vec<T>>) -> Arc<Vec<T>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(items).clone()
    }

    fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Keeps the collection until `ttl` has passed since it was stored
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<Vec<T>>)>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: RwLock::new(None) }
    }
}

impl<T: Send + Sync> CollectionCache<T> for TtlCache<T> {
    fn get(&self) -> Option<Arc<Vec<T>>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some((stored_at, items)) if stored_at.elapsed() < self.ttl => Some(items.clone()),
            _ => None,
        }
    }

    fn get_or_set(&self, items: Arc<Vec<T>>) -> Arc<Vec<T>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((stored_at, cached)) = slot.as_ref() {
            if stored_at.elapsed() < self.ttl {
                return cached.clone();
            }
        }
        *slot = Some((Instant::now(), items.clone()));
        items
    }

    fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Cache for the configured lifetime: `None` keeps entries forever
pub fn cache_for<T>(ttl: Option<Duration>) -> Arc<dyn CollectionCache<T>>
where
    T: Send + Sync + 'static,
{
    match ttl {
        Some(ttl) => Arc::new(TtlCache::new(ttl)),
        None => Arc::new(ProcessCache::new()),
    }
}
