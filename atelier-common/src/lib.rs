//! # Atelier Common Library
//!
//! Shared code for the Atelier portfolio site:
//! - CMS content entities and lenient decoding
//! - Filter/sort derivation for works and exhibitions
//! - Swedish-aware title collation
//! - Collection state providers (memoized views, active selection)
//! - Grid view composition and exhibition/work cross-references
//! - Configuration loading

pub mod collation;
pub mod config;
pub mod derive;
pub mod entities;
pub mod error;
pub mod state;
pub mod view;
pub mod xref;

pub use collation::TitleCollation;
pub use entities::{
    BiographyItem, CmsEntity, EducationItem, EntityId, ExhibitionItem, ExhibitionListItem,
    GrantItem, WorkItem,
};
pub use error::{Error, Result};
