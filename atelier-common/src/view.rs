//! Unified grid items
//!
//! The gallery renders works, exhibitions and the info records through one
//! grid abstraction. Each item carries a `type` tag so the front-end can
//! pick the card layout.

use serde::Serialize;

use crate::entities::{BiographyItem, EducationItem, ExhibitionItem, GrantItem, WorkItem};

/// One grid cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridItem {
    Work(WorkItem),
    Exhibition(ExhibitionItem),
    Biography(BiographyItem),
    Education(EducationItem),
    Grant(GrantItem),
}

pub fn work_grid(works: &[WorkItem]) -> Vec<GridItem> {
    works.iter().cloned().map(GridItem::Work).collect()
}

pub fn exhibition_grid(exhibitions: &[ExhibitionItem]) -> Vec<GridItem> {
    exhibitions.iter().cloned().map(GridItem::Exhibition).collect()
}

/// Info page sections, each already wrapped as grid items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoSections {
    pub biography: Vec<GridItem>,
    pub education: Vec<GridItem>,
    pub grants: Vec<GridItem>,
}

impl InfoSections {
    pub fn new(
        biography: &[BiographyItem],
        education: &[EducationItem],
        grants: &[GrantItem],
    ) -> Self {
        Self {
            biography: biography.iter().cloned().map(GridItem::Biography).collect(),
            education: education.iter().cloned().map(GridItem::Education).collect(),
            grants: grants.iter().cloned().map(GridItem::Grant).collect(),
        }
    }
}
