//! Filtered and sorted views over content collections
//!
//! Pure functions: the input slice is never modified and every call returns
//! a freshly built `Vec`. Sorting uses the stable `sort_by`, so elements
//! with equal keys keep their input order.
//!
//! Pipeline for both collection types:
//! 1. category/type filter
//! 2. year filter
//! 3. free-text filter (works only)
//! 4. sort

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::collation::{compare_titles, TitleCollation};
use crate::entities::{ExhibitionItem, WorkItem};
use crate::Error;

// ============================================================================
// Works
// ============================================================================

/// Work ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkSort {
    /// Newest first
    #[default]
    YearLatest,
    /// Oldest first
    YearOldest,
    /// Restrict to one selected year, no reordering
    Year,
    Title,
}

impl FromStr for WorkSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year-latest" => Ok(WorkSort::YearLatest),
            "year-oldest" => Ok(WorkSort::YearOldest),
            "year" => Ok(WorkSort::Year),
            "title" => Ok(WorkSort::Title),
            other => Err(Error::InvalidInput(format!("unknown work sort mode: {}", other))),
        }
    }
}

/// Work category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkCategory {
    #[default]
    All,
    Painting,
    Drawing,
    Sculpture,
    Textile,
}

impl WorkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCategory::All => "all",
            WorkCategory::Painting => "painting",
            WorkCategory::Drawing => "drawing",
            WorkCategory::Sculpture => "sculpture",
            WorkCategory::Textile => "textile",
        }
    }

    /// The CMS category is lower-cased before comparison
    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            WorkCategory::All => true,
            other => category
                .map(|c| c.trim().to_lowercase() == other.as_str())
                .unwrap_or(false),
        }
    }
}

impl FromStr for WorkCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(WorkCategory::All),
            "painting" => Ok(WorkCategory::Painting),
            "drawing" => Ok(WorkCategory::Drawing),
            "sculpture" => Ok(WorkCategory::Sculpture),
            "textile" => Ok(WorkCategory::Textile),
            other => Err(Error::InvalidInput(format!("unknown work category: {}", other))),
        }
    }
}

impl fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of the works view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WorkQuery {
    pub sort: WorkSort,
    /// Only consulted when `sort` is [`WorkSort::Year`]
    pub selected_year: Option<i32>,
    pub category: WorkCategory,
    /// Case-insensitive title substring; blank means no filter
    pub search: String,
    pub collation: TitleCollation,
}

/// Derive the works view
pub fn derive_works(works: &[WorkItem], query: &WorkQuery) -> Vec<WorkItem> {
    let needle = query.search.trim().to_lowercase();
    let year = match query.sort {
        WorkSort::Year => query.selected_year,
        _ => None,
    };

    let mut out: Vec<WorkItem> = works
        .iter()
        .filter(|work| query.category.matches(work.acf.category.as_deref()))
        .filter(|work| year.map_or(true, |y| work.acf.year == Some(y)))
        .filter(|work| needle.is_empty() || work.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match query.sort {
        WorkSort::YearLatest => out.sort_by(|a, b| b.sort_year().cmp(&a.sort_year())),
        WorkSort::YearOldest => out.sort_by(|a, b| a.sort_year().cmp(&b.sort_year())),
        WorkSort::Title => {
            out.sort_by(|a, b| compare_titles(&a.title, &b.title, query.collation))
        }
        WorkSort::Year => {}
    }

    out
}

/// Distinct work years, newest first (for year selectors)
pub fn work_years(works: &[WorkItem]) -> Vec<i32> {
    let mut years: Vec<i32> = works.iter().filter_map(|w| w.acf.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

// ============================================================================
// Exhibitions
// ============================================================================

/// Exhibition ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhibitionSort {
    /// Year filter only, CMS order kept
    #[default]
    Year,
    Title,
    /// Type filter only, CMS order kept
    // TODO: confirm with the site owner whether "type" should also group by
    // exhibition_type; it currently filters without reordering.
    Type,
}

impl FromStr for ExhibitionSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(ExhibitionSort::Year),
            "title" => Ok(ExhibitionSort::Title),
            "type" => Ok(ExhibitionSort::Type),
            other => Err(Error::InvalidInput(format!(
                "unknown exhibition sort mode: {}",
                other
            ))),
        }
    }
}

/// `"all"` or one specific value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Missing, blank and `"all"` select everything
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Selection::All,
            Some(value) => Selection::Only(value.to_string()),
        }
    }

    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => "all",
            Selection::Only(value) => value,
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Map short exhibition type aliases onto the CMS's stored values
///
/// Some views pass "Solo"/"Group" while the CMS stores "Solo Exhibition"/
/// "Group Exhibition". Anything else is passed through trimmed and is then
/// compared verbatim (case-sensitive) against `exhibition_type`.
pub fn normalize_exhibition_type(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "solo" => "Solo Exhibition".to_string(),
        "group" => "Group Exhibition".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Parameters of the exhibitions view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExhibitionQuery {
    pub sort: ExhibitionSort,
    /// Compared as a string against the calendar year of `start_date`
    pub selected_year: Selection,
    pub selected_type: Selection,
    pub collation: TitleCollation,
}

impl ExhibitionQuery {
    /// Set the type filter, normalizing short aliases
    pub fn with_type(mut self, raw: Option<&str>) -> Self {
        self.selected_type = match Selection::parse(raw) {
            Selection::All => Selection::All,
            Selection::Only(value) => Selection::Only(normalize_exhibition_type(&value)),
        };
        self
    }
}

/// Derive the exhibitions view
pub fn derive_exhibitions(
    exhibitions: &[ExhibitionItem],
    query: &ExhibitionQuery,
) -> Vec<ExhibitionItem> {
    let mut out: Vec<ExhibitionItem> = exhibitions
        .iter()
        .filter(|e| query.selected_type.admits(e.acf.exhibition_type.as_deref()))
        .filter(|e| {
            let year = e.start_year().map(|y| y.to_string());
            query.selected_year.admits(year.as_deref())
        })
        .cloned()
        .collect();

    match query.sort {
        ExhibitionSort::Title => {
            out.sort_by(|a, b| compare_titles(&a.title, &b.title, query.collation))
        }
        ExhibitionSort::Year | ExhibitionSort::Type => {}
    }

    out
}

/// Distinct exhibition start years, newest first
pub fn exhibition_years(exhibitions: &[ExhibitionItem]) -> Vec<String> {
    let mut years: Vec<i32> = exhibitions.iter().filter_map(|e| e.start_year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years.into_iter().map(|y| y.to_string()).collect()
}

/// Distinct exhibition types in first-seen order
pub fn exhibition_types(exhibitions: &[ExhibitionItem]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for e in exhibitions {
        if let Some(t) = e.acf.exhibition_type.as_deref() {
            if !types.iter().any(|seen| seen == t) {
                types.push(t.to_string());
            }
        }
    }
    types
}
