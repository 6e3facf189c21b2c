//! Collection state providers
//!
//! A provider owns one fetched collection together with the view parameters
//! applied to it, the memoized derived view and the active-item selection
//! (the work or exhibition currently open in detail view).
//!
//! The derived view is recomputed only when the collection or the query
//! actually changes. Callers get an `Arc<[T]>`: an unchanged view is the
//! same allocation (`Arc::ptr_eq`), a recomputed one is always fresh.

use std::sync::Arc;

use crate::derive::{derive_exhibitions, derive_works, ExhibitionQuery, WorkQuery};
use crate::entities::{CmsEntity, EntityId, ExhibitionItem, WorkItem};

/// Entity types that have a filtered/sorted view
pub trait Derivable: CmsEntity + Clone {
    type Query: Clone + PartialEq + Default;

    fn derive(items: &[Self], query: &Self::Query) -> Vec<Self>;
}

impl Derivable for WorkItem {
    type Query = WorkQuery;

    fn derive(items: &[Self], query: &Self::Query) -> Vec<Self> {
        derive_works(items, query)
    }
}

impl Derivable for ExhibitionItem {
    type Query = ExhibitionQuery;

    fn derive(items: &[Self], query: &Self::Query) -> Vec<Self> {
        derive_exhibitions(items, query)
    }
}

/// State container for one collection
pub struct CollectionProvider<T: Derivable> {
    items: Vec<T>,
    query: T::Query,
    view: Option<Arc<[T]>>,
    active_slug: Option<String>,
}

impl<T: Derivable> Default for CollectionProvider<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Derivable> CollectionProvider<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            query: T::Query::default(),
            view: None,
            active_slug: None,
        }
    }

    /// The full, underived collection
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Swap in a newly fetched collection
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.view = None;
    }

    pub fn query(&self) -> &T::Query {
        &self.query
    }

    /// Replace the view parameters; an identical query keeps the memoized view
    pub fn set_query(&mut self, query: T::Query) {
        if query != self.query {
            self.query = query;
            self.view = None;
        }
    }

    /// Derived view for the current collection and query
    pub fn view(&mut self) -> Arc<[T]> {
        self.view
            .get_or_insert_with(|| T::derive(&self.items, &self.query).into())
            .clone()
    }

    /// Select the item with `slug` for detail display
    ///
    /// An unknown slug clears the selection.
    pub fn open(&mut self, slug: &str) -> Option<&T> {
        let found = self.items.iter().position(|item| item.slug() == slug);
        self.active_slug = found.map(|_| slug.to_string());
        found.map(|index| &self.items[index])
    }

    pub fn close(&mut self) {
        self.active_slug = None;
    }

    pub fn active(&self) -> Option<&T> {
        let slug = self.active_slug.as_deref()?;
        self.items.iter().find(|item| item.slug() == slug)
    }

    /// Drop an item after the CMS confirmed its deletion
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let removed = self.items.remove(index);
        self.view = None;
        if self.active_slug.as_deref() == Some(removed.slug()) {
            self.active_slug = None;
        }
        Some(removed)
    }
}
