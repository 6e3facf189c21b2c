//! Gallery loader
//!
//! Fetches every collection concurrently and returns as soon as all of
//! them arrived or the readiness timeout expired, whichever comes first.
//! A fetch still running at the deadline is not aborted: its result is
//! dropped here but a cached type still lands in its cache.

use std::sync::Arc;
use std::time::Duration;

use atelier_common::{
    BiographyItem, EducationItem, ExhibitionItem, ExhibitionListItem, GrantItem, WorkItem,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::cms::content::ContentClient;

enum Loaded {
    Works(Arc<Vec<WorkItem>>),
    Exhibitions(Arc<Vec<ExhibitionItem>>),
    ExhibitionList(Vec<ExhibitionListItem>),
    Biography(Vec<BiographyItem>),
    Education(Vec<EducationItem>),
    Grants(Vec<GrantItem>),
}

const COLLECTIONS: usize = 6;

/// Collections that arrived before the deadline; `None` is still loading
#[derive(Debug, Default)]
pub struct GalleryData {
    pub works: Option<Arc<Vec<WorkItem>>>,
    pub exhibitions: Option<Arc<Vec<ExhibitionItem>>>,
    pub exhibition_list: Option<Vec<ExhibitionListItem>>,
    pub biography: Option<Vec<BiographyItem>>,
    pub education: Option<Vec<EducationItem>>,
    pub grants: Option<Vec<GrantItem>>,
    pub timed_out: bool,
}

/// Per-collection loading state; `true` while a fetch is outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingFlags {
    pub works: bool,
    pub exhibitions: bool,
    pub exhibition_list: bool,
    pub biography: bool,
    pub education: bool,
    pub grants: bool,
}

impl LoadingFlags {
    pub fn any(&self) -> bool {
        self.works
            || self.exhibitions
            || self.exhibition_list
            || self.biography
            || self.education
            || self.grants
    }
}

impl GalleryData {
    pub fn loading(&self) -> LoadingFlags {
        LoadingFlags {
            works: self.works.is_none(),
            exhibitions: self.exhibitions.is_none(),
            exhibition_list: self.exhibition_list.is_none(),
            biography: self.biography.is_none(),
            education: self.education.is_none(),
            grants: self.grants.is_none(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.loading().any()
    }

    fn apply(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Works(items) => self.works = Some(items),
            Loaded::Exhibitions(items) => self.exhibitions = Some(items),
            Loaded::ExhibitionList(items) => self.exhibition_list = Some(items),
            Loaded::Biography(items) => self.biography = Some(items),
            Loaded::Education(items) => self.education = Some(items),
            Loaded::Grants(items) => self.grants = Some(items),
        }
    }
}

/// Load all collections, waiting at most `ready_timeout`
pub async fn load_gallery(content: Arc<ContentClient>, ready_timeout: Duration) -> GalleryData {
    let deadline = Instant::now() + ready_timeout;
    // Capacity covers every sender, so a late send never blocks
    let (tx, mut rx) = mpsc::channel(COLLECTIONS);

    macro_rules! spawn_fetch {
        ($variant:ident, $fetch:ident) => {{
            let tx = tx.clone();
            let content = content.clone();
            tokio::spawn(async move {
                let loaded = Loaded::$variant(content.$fetch().await);
                // Receiver is gone once the deadline passed
                let _ = tx.send(loaded).await;
            });
        }};
    }

    spawn_fetch!(Works, fetch_works);
    spawn_fetch!(Exhibitions, fetch_exhibitions);
    spawn_fetch!(ExhibitionList, fetch_exhibition_list);
    spawn_fetch!(Biography, fetch_biography);
    spawn_fetch!(Education, fetch_education);
    spawn_fetch!(Grants, fetch_grants);
    drop(tx);

    let mut data = GalleryData::default();
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(loaded)) => data.apply(loaded),
            Ok(None) => break,
            Err(_) => {
                data.timed_out = true;
                warn!(
                    timeout_ms = ready_timeout.as_millis() as u64,
                    loading = ?data.loading(),
                    "Gallery readiness timeout; serving partial content"
                );
                break;
            }
        }
    }

    debug!(complete = data.is_complete(), "Gallery load finished");
    data
}
