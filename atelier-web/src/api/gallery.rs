//! Public gallery endpoints
//!
//! Read-only views over the CMS content. List endpoints always answer 200:
//! a CMS failure shows up as an empty list, never as an error status.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use atelier_common::derive::{
    exhibition_types, exhibition_years, work_years, ExhibitionQuery, ExhibitionSort, Selection,
    WorkCategory, WorkQuery, WorkSort,
};
use atelier_common::view::{exhibition_grid, work_grid, GridItem, InfoSections};
use atelier_common::xref::{resolve_work_references, ResolvedReference};
use atelier_common::{ExhibitionItem, ExhibitionListItem, WorkItem};

use crate::gallery::{load_gallery, LoadingFlags};
use crate::AppState;

/// Gallery API errors
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = match self {
            GalleryError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

fn parse_param<T>(name: &str, raw: Option<&str>) -> Result<Option<T>, GalleryError>
where
    T: std::str::FromStr,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| GalleryError::InvalidParam(format!("{}={}", name, value))),
        None => Ok(None),
    }
}

// ============================================================================
// Works
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WorksParams {
    pub sort: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    /// Slug of the work open in detail view
    pub active: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorksResponse {
    pub query: WorkQuery,
    /// Distinct years across the whole collection, newest first
    pub years: Vec<i32>,
    pub total: usize,
    pub items: Vec<GridItem>,
    pub active: Option<WorkItem>,
}

/// GET /api/works?sort=&year=&category=&q=&active=
pub async fn list_works(
    State(state): State<AppState>,
    Query(params): Query<WorksParams>,
) -> Result<Json<WorksResponse>, GalleryError> {
    let query = WorkQuery {
        sort: parse_param::<WorkSort>("sort", params.sort.as_deref())?.unwrap_or_default(),
        selected_year: parse_param::<i32>("year", params.year.as_deref())?,
        category: parse_param::<WorkCategory>("category", params.category.as_deref())?
            .unwrap_or_default(),
        search: params.q.unwrap_or_default(),
        collation: state.config.title_collation,
    };

    let works = state.content.fetch_works().await;
    let response = state.views.works.read(
        &works,
        query,
        params.active.as_deref(),
        |provider, view| WorksResponse {
            query: provider.query().clone(),
            years: work_years(provider.items()),
            total: provider.len(),
            items: work_grid(view),
            active: provider.active().cloned(),
        },
    );
    Ok(Json(response))
}

/// GET /api/works/:slug
pub async fn get_work(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<WorkItem>, GalleryError> {
    state
        .content
        .fetch_work_by_slug(&slug)
        .await
        .map(Json)
        .ok_or_else(|| GalleryError::NotFound(format!("work {}", slug)))
}

// ============================================================================
// Exhibitions
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ExhibitionsParams {
    pub sort: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub exhibition_type: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExhibitionsResponse {
    pub query: ExhibitionQuery,
    pub years: Vec<String>,
    pub types: Vec<String>,
    pub total: usize,
    pub items: Vec<GridItem>,
    pub active: Option<ExhibitionItem>,
}

/// GET /api/exhibitions?sort=&year=&type=&active=
pub async fn list_exhibitions(
    State(state): State<AppState>,
    Query(params): Query<ExhibitionsParams>,
) -> Result<Json<ExhibitionsResponse>, GalleryError> {
    let query = ExhibitionQuery {
        sort: parse_param::<ExhibitionSort>("sort", params.sort.as_deref())?.unwrap_or_default(),
        selected_year: Selection::parse(params.year.as_deref()),
        collation: state.config.title_collation,
        ..Default::default()
    }
    .with_type(params.exhibition_type.as_deref());

    let exhibitions = state.content.fetch_exhibitions().await;
    let response = state.views.exhibitions.read(
        &exhibitions,
        query,
        params.active.as_deref(),
        |provider, view| ExhibitionsResponse {
            query: provider.query().clone(),
            years: exhibition_years(provider.items()),
            types: exhibition_types(provider.items()),
            total: provider.len(),
            items: exhibition_grid(view),
            active: provider.active().cloned(),
        },
    );
    Ok(Json(response))
}

/// GET /api/exhibitions/:slug
pub async fn get_exhibition(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ExhibitionItem>, GalleryError> {
    state
        .content
        .fetch_exhibition_by_slug(&slug)
        .await
        .map(Json)
        .ok_or_else(|| GalleryError::NotFound(format!("exhibition {}", slug)))
}

#[derive(Debug, Serialize)]
pub struct ExhibitionWorksResponse {
    pub exhibition: String,
    pub references: Vec<ResolvedReference>,
}

/// GET /api/exhibitions/:slug/works
///
/// Work references are matched by title and may not resolve.
pub async fn get_exhibition_works(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ExhibitionWorksResponse>, GalleryError> {
    let (exhibition, works) = tokio::join!(
        state.content.fetch_exhibition_by_slug(&slug),
        state.content.fetch_works()
    );
    let exhibition =
        exhibition.ok_or_else(|| GalleryError::NotFound(format!("exhibition {}", slug)))?;

    Ok(Json(ExhibitionWorksResponse {
        references: resolve_work_references(&exhibition, &works),
        exhibition: exhibition.slug,
    }))
}

/// GET /api/exhibition-list
pub async fn list_exhibition_index(
    State(state): State<AppState>,
) -> Json<Vec<ExhibitionListItem>> {
    Json(state.content.fetch_exhibition_list().await)
}

// ============================================================================
// Info and gallery
// ============================================================================

/// GET /api/info
pub async fn get_info(State(state): State<AppState>) -> Json<InfoSections> {
    let (biography, education, grants) = tokio::join!(
        state.content.fetch_biography(),
        state.content.fetch_education(),
        state.content.fetch_grants()
    );
    Json(InfoSections::new(&biography, &education, &grants))
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    /// False when the readiness timeout cut the load short
    pub complete: bool,
    pub loading: LoadingFlags,
    pub works: Vec<GridItem>,
    pub exhibitions: Vec<GridItem>,
    pub exhibition_list: Vec<ExhibitionListItem>,
    pub info: InfoSections,
}

/// GET /api/gallery
///
/// Snapshot of every collection, bounded by the readiness timeout.
/// Collections that missed the deadline are empty and flagged as loading.
pub async fn get_gallery(State(state): State<AppState>) -> Json<GalleryResponse> {
    let data = load_gallery(state.content.clone(), state.config.ready_timeout).await;
    let collation = state.config.title_collation;

    // Default views; the providers keep them memoized between snapshots
    let works = match &data.works {
        Some(works) => {
            let query = WorkQuery { collation, ..Default::default() };
            state.views.works.read(works, query, None, |_, view| work_grid(view))
        }
        None => Vec::new(),
    };

    let exhibitions = match &data.exhibitions {
        Some(exhibitions) => {
            let query = ExhibitionQuery { collation, ..Default::default() };
            state.views.exhibitions.read(exhibitions, query, None, |_, view| exhibition_grid(view))
        }
        None => Vec::new(),
    };

    let info = InfoSections::new(
        data.biography.as_deref().unwrap_or_default(),
        data.education.as_deref().unwrap_or_default(),
        data.grants.as_deref().unwrap_or_default(),
    );

    Json(GalleryResponse {
        complete: data.is_complete(),
        loading: data.loading(),
        works,
        exhibitions,
        exhibition_list: data.exhibition_list.clone().unwrap_or_default(),
        info,
    })
}
