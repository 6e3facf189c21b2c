//! Public content client
//!
//! One fetch operation per entity type. Reads never fail from the caller's
//! point of view: network errors, non-success statuses and bodies of the
//! wrong shape all degrade to an empty collection (or `None` for detail
//! lookups) and are logged. There are no retries.
//!
//! Works and exhibitions go through a [`CollectionCache`]. Only a
//! successful fetch is stored, so a failed read is retried on the next
//! request. Two concurrent first reads may both hit the CMS; the first one
//! to finish fills the cache slot and the other caller gets that stored
//! collection back.

use std::sync::Arc;

use atelier_common::config::SiteConfig;
use atelier_common::entities::{decode_collection, decode_single};
use atelier_common::{
    BiographyItem, CmsEntity, EducationItem, ExhibitionItem, ExhibitionListItem, GrantItem,
    WorkItem,
};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::cache::{cache_for, CollectionCache};
use super::{parse_url, CmsEndpoint, EntityKind};
use crate::error::{Error, Result};

pub struct ContentClient {
    http: reqwest::Client,
    endpoint: CmsEndpoint,
    works: Arc<dyn CollectionCache<WorkItem>>,
    exhibitions: Arc<dyn CollectionCache<ExhibitionItem>>,
}

impl ContentClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: CmsEndpoint,
        works: Arc<dyn CollectionCache<WorkItem>>,
        exhibitions: Arc<dyn CollectionCache<ExhibitionItem>>,
    ) -> Self {
        Self { http, endpoint, works, exhibitions }
    }

    /// Client with the caches selected by `config.cache_ttl`
    pub fn from_config(http: reqwest::Client, config: &SiteConfig) -> Self {
        Self::new(
            http,
            CmsEndpoint::new(&config.cms_base_url, config.per_page),
            cache_for(config.cache_ttl),
            cache_for(config.cache_ttl),
        )
    }

    pub async fn fetch_works(&self) -> Arc<Vec<WorkItem>> {
        self.fetch_cached(EntityKind::Work, self.works.as_ref()).await
    }

    pub async fn fetch_exhibitions(&self) -> Arc<Vec<ExhibitionItem>> {
        self.fetch_cached(EntityKind::Exhibition, self.exhibitions.as_ref()).await
    }

    pub async fn fetch_exhibition_list(&self) -> Vec<ExhibitionListItem> {
        self.fetch_uncached(EntityKind::ExhibitionList).await
    }

    pub async fn fetch_biography(&self) -> Vec<BiographyItem> {
        self.fetch_uncached(EntityKind::Biography).await
    }

    pub async fn fetch_education(&self) -> Vec<EducationItem> {
        self.fetch_uncached(EntityKind::Education).await
    }

    pub async fn fetch_grants(&self) -> Vec<GrantItem> {
        self.fetch_uncached(EntityKind::Grant).await
    }

    pub async fn fetch_work_by_slug(&self, slug: &str) -> Option<WorkItem> {
        self.fetch_by_slug(EntityKind::Work, slug).await
    }

    pub async fn fetch_exhibition_by_slug(&self, slug: &str) -> Option<ExhibitionItem> {
        self.fetch_by_slug(EntityKind::Exhibition, slug).await
    }

    /// Drop the cached collection for `kind`, if it is a cached type
    pub fn invalidate(&self, kind: EntityKind) {
        match kind {
            EntityKind::Work => self.works.clear(),
            EntityKind::Exhibition => self.exhibitions.clear(),
            _ => return,
        }
        debug!(kind = kind.cms_path(), "Cleared cached collection");
    }

    async fn fetch_cached<T: CmsEntity>(
        &self,
        kind: EntityKind,
        cache: &dyn CollectionCache<T>,
    ) -> Arc<Vec<T>> {
        if let Some(items) = cache.get() {
            debug!(kind = kind.cms_path(), count = items.len(), "Cache hit");
            return items;
        }

        match self.try_fetch_list(kind).await {
            Ok(items) => cache.get_or_set(Arc::new(items)),
            Err(e) => {
                warn!(kind = kind.cms_path(), error = %e, "Failed to fetch collection");
                Arc::new(Vec::new())
            }
        }
    }

    async fn fetch_uncached<T: CmsEntity>(&self, kind: EntityKind) -> Vec<T> {
        self.try_fetch_list(kind).await.unwrap_or_else(|e| {
            warn!(kind = kind.cms_path(), error = %e, "Failed to fetch collection");
            Vec::new()
        })
    }

    async fn fetch_by_slug<T: CmsEntity>(&self, kind: EntityKind, slug: &str) -> Option<T> {
        let result = match self.endpoint.slug_url(kind, slug) {
            Ok(url) => self.get_json(url).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(body) => decode_single(body),
            Err(e) => {
                warn!(kind = kind.cms_path(), slug = %slug, error = %e, "Failed to fetch record");
                None
            }
        }
    }

    async fn try_fetch_list<T: CmsEntity>(&self, kind: EntityKind) -> Result<Vec<T>> {
        let url = parse_url(&self.endpoint.list_url(kind))?;
        let body = self.get_json(url).await?;
        if !body.is_array() {
            return Err(Error::UnexpectedShape(format!(
                "{} list is not an array",
                kind.cms_path()
            )));
        }

        let items: Vec<T> = decode_collection(body);
        info!(kind = kind.cms_path(), count = items.len(), "Fetched collection from CMS");
        Ok(items)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(url = %url, "Querying CMS");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(status.as_u16(), error_text));
        }

        Ok(response.json().await?)
    }
}
