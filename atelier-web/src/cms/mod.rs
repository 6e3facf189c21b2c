//! Headless CMS access
//!
//! - [`content`]: public read path with collection caching
//! - [`proxy`]: authenticated admin writes relayed to the CMS
//! - [`cache`]: collection cache implementations

pub mod cache;
pub mod content;
pub mod proxy;

use atelier_common::config::CmsCredentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;

use crate::error::{Error, Result};

/// CMS post types the site reads and administers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Work,
    Exhibition,
    ExhibitionList,
    Education,
    Grant,
    Biography,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Work,
        EntityKind::Exhibition,
        EntityKind::ExhibitionList,
        EntityKind::Education,
        EntityKind::Grant,
        EntityKind::Biography,
    ];

    /// REST path segment on the CMS
    pub fn cms_path(&self) -> &'static str {
        match self {
            EntityKind::Work => "work",
            EntityKind::Exhibition => "exhibition",
            EntityKind::ExhibitionList => "exhibition_list",
            EntityKind::Education => "education",
            EntityKind::Grant => "grant",
            EntityKind::Biography => "biography",
        }
    }

    /// Path segment under `/admin/api`
    pub fn admin_route(&self) -> &'static str {
        match self {
            EntityKind::Work => "works",
            EntityKind::Exhibition => "exhibitions",
            EntityKind::ExhibitionList => "exhibition-list",
            EntityKind::Education => "education",
            EntityKind::Grant => "grants",
            EntityKind::Biography => "biography",
        }
    }

    /// Works and exhibitions are requested with embedded media
    pub fn embeds_media(&self) -> bool {
        matches!(self, EntityKind::Work | EntityKind::Exhibition)
    }
}

/// URL builder for one CMS REST root
#[derive(Debug, Clone)]
pub struct CmsEndpoint {
    base_url: String,
    per_page: u32,
}

impl CmsEndpoint {
    pub fn new(base_url: impl Into<String>, per_page: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, per_page }
    }

    /// Collection query, e.g. `work?_embed&acf_format=standard&per_page=100`
    pub fn list_url(&self, kind: EntityKind) -> String {
        let embed = if kind.embeds_media() { "_embed&" } else { "" };
        format!(
            "{}/{}?{}acf_format=standard&per_page={}",
            self.base_url,
            kind.cms_path(),
            embed,
            self.per_page
        )
    }

    /// Collection query narrowed to one slug (0 or 1 results)
    pub fn slug_url(&self, kind: EntityKind, slug: &str) -> Result<Url> {
        let mut url = parse_url(&self.list_url(kind))?;
        url.query_pairs_mut().append_pair("slug", slug);
        Ok(url)
    }

    pub fn item_url(&self, kind: EntityKind, id: u64) -> String {
        format!("{}/{}/{}", self.base_url, kind.cms_path(), id)
    }

    /// Single record with embedded media, used to re-read after a write
    pub fn embedded_item_url(&self, kind: EntityKind, id: u64) -> String {
        format!("{}?_embed&acf_format=standard", self.item_url(kind, id))
    }

    /// Permanent delete, bypassing the CMS trash
    pub fn delete_url(&self, kind: EntityKind, id: u64) -> String {
        format!("{}?force=true", self.item_url(kind, id))
    }

    pub fn create_url(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.cms_path())
    }

    pub fn media_url(&self) -> String {
        format!("{}/media", self.base_url)
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::Url(format!("{}: {}", raw, e)))
}

/// `Authorization` header value for CMS application-password auth
pub fn basic_auth_header(credentials: &CmsCredentials) -> String {
    let pair = format!("{}:{}", credentials.username, credentials.app_password);
    format!("Basic {}", STANDARD.encode(pair))
}
