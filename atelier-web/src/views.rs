//! Long-lived collection providers
//!
//! `AppState` keeps one [`CollectionProvider`] per cached collection for the
//! process lifetime. A provider is refilled only when the content client
//! hands out a different collection than the one it was filled from, so a
//! request repeating the previous query gets the memoized view back.
//!
//! Each provider sits behind a `std::sync::Mutex` that is never held across
//! an await.

use std::sync::{Arc, Mutex, PoisonError};

use atelier_common::state::{CollectionProvider, Derivable};
use atelier_common::{EntityId, ExhibitionItem, WorkItem};
use tracing::debug;

use crate::cms::EntityKind;

/// A provider and the cached collection it mirrors
pub struct SharedProvider<T: Derivable> {
    slot: Mutex<Slot<T>>,
}

struct Slot<T: Derivable> {
    source: Option<Arc<Vec<T>>>,
    provider: CollectionProvider<T>,
}

impl<T: Derivable> Slot<T> {
    fn sync(&mut self, source: &Arc<Vec<T>>) {
        if let Some(held) = &self.source {
            if Arc::ptr_eq(held, source) {
                return;
            }
        }
        self.provider.replace_items(source.as_ref().clone());
        self.source = Some(source.clone());
    }
}

impl<T: Derivable> Default for SharedProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Derivable> SharedProvider<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                source: None,
                provider: CollectionProvider::default(),
            }),
        }
    }

    /// Apply `query` and the `active` selection to `source`, then hand the
    /// provider and its derived view to `inspect`
    pub fn read<R>(
        &self,
        source: &Arc<Vec<T>>,
        query: T::Query,
        active: Option<&str>,
        inspect: impl FnOnce(&CollectionProvider<T>, &[T]) -> R,
    ) -> R {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = &mut *guard;
        slot.sync(source);

        let provider = &mut slot.provider;
        provider.set_query(query);
        match active {
            Some(slug) => {
                provider.open(slug);
            }
            None => provider.close(),
        }

        let view = provider.view();
        inspect(&*provider, &view[..])
    }

    /// Drop a record the CMS confirmed deleted
    pub fn remove(&self, id: EntityId) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .provider
            .remove(id)
    }
}

/// Providers for the two cached collections
#[derive(Default)]
pub struct CollectionViews {
    pub works: SharedProvider<WorkItem>,
    pub exhibitions: SharedProvider<ExhibitionItem>,
}

impl CollectionViews {
    /// Apply a confirmed delete of record `id` to the matching provider
    pub fn remove(&self, kind: EntityKind, id: u64) {
        let id = EntityId::Stable(id);
        let removed = match kind {
            EntityKind::Work => self.works.remove(id).is_some(),
            EntityKind::Exhibition => self.exhibitions.remove(id).is_some(),
            _ => return,
        };
        debug!(kind = kind.cms_path(), id = %id, removed, "Applied delete to collection view");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_common::derive::{WorkCategory, WorkQuery};
    use atelier_common::entities::WorkFields;

    fn work(id: u64, slug: &str, category: &str) -> WorkItem {
        WorkItem {
            id: EntityId::Stable(id),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            acf: WorkFields {
                category: Some(category.to_string()),
                ..Default::default()
            },
            image_url: None,
        }
    }

    fn collection() -> Arc<Vec<WorkItem>> {
        Arc::new(vec![work(1, "a", "painting"), work(2, "b", "textile")])
    }

    fn paintings() -> WorkQuery {
        WorkQuery {
            category: WorkCategory::Painting,
            ..Default::default()
        }
    }

    fn view_of(
        shared: &SharedProvider<WorkItem>,
        source: &Arc<Vec<WorkItem>>,
    ) -> Arc<[WorkItem]> {
        shared.read(source, paintings(), None, |_, view| Arc::from(view))
    }

    #[test]
    fn test_same_source_and_query_reuse_view() {
        let shared = SharedProvider::new();
        let source = collection();

        let first = shared.read(&source, paintings(), None, |provider, view| {
            assert_eq!(provider.len(), 2);
            view.as_ptr()
        });
        let second = shared.read(&source, paintings(), None, |_, view| view.as_ptr());
        assert_eq!(first, second);

        let all = shared.read(&source, WorkQuery::default(), None, |_, view| view.len());
        assert_eq!(all, 2);
    }

    #[test]
    fn test_new_source_refills_provider() {
        let shared = SharedProvider::new();
        assert_eq!(view_of(&shared, &collection()).len(), 1);

        let refreshed = Arc::new(vec![work(3, "c", "painting"), work(4, "d", "painting")]);
        let view = view_of(&shared, &refreshed);
        let slugs: Vec<&str> = view.iter().map(|w| w.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "d"]);
    }

    #[test]
    fn test_active_selection_follows_request() {
        let shared = SharedProvider::new();
        let source = collection();

        let active = shared.read(&source, paintings(), Some("b"), |provider, _| {
            provider.active().map(|w| w.id)
        });
        assert_eq!(active, Some(EntityId::Stable(2)));

        let active = shared.read(&source, paintings(), None, |provider, _| {
            provider.active().map(|w| w.id)
        });
        assert_eq!(active, None);
    }

    #[test]
    fn test_remove_applies_to_matching_kind() {
        let views = CollectionViews::default();
        let source = collection();
        views.works.read(&source, WorkQuery::default(), None, |_, _| ());

        views.remove(EntityKind::Grant, 1);
        views.remove(EntityKind::Work, 1);

        let slugs = views.works.read(&source, WorkQuery::default(), None, |_, view| {
            view.iter().map(|w| w.slug.clone()).collect::<Vec<_>>()
        });
        assert_eq!(slugs, vec!["b"]);
    }
}
