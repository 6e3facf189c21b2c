//! Content entities as served by the CMS
//!
//! Every entity is owned by the CMS. These types are the transient,
//! read-mostly copy the site works with. Field names follow the CMS
//! (`acf` is the custom-field attribute bag, `_embedded` carries media).
//!
//! Decoding is deliberately forgiving: CMS custom fields arrive as numbers,
//! numeric strings, empty strings or `false` depending on how they were
//! edited, and a missing `id` is backfilled from the list position.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use crate::Result;

/// Identity of a CMS record
///
/// `Synthetic` ids are list positions substituted when the CMS omitted the
/// `id` field. They depend on response order and are not stable across
/// requests, so nothing may be written back to the CMS using one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityId {
    Stable(u64),
    Synthetic(usize),
}

impl EntityId {
    /// Use the CMS id when present, else fall back to the list position
    pub fn from_raw(raw: Option<u64>, index: usize) -> Self {
        match raw {
            Some(id) => EntityId::Stable(id),
            None => EntityId::Synthetic(index),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Stable(id) => write!(f, "{}", id),
            EntityId::Synthetic(index) => write!(f, "synthetic#{}", index),
        }
    }
}

/// Behaviour shared by every CMS-backed record
pub trait CmsEntity: Sized {
    /// Build the entity from one element of a CMS list response
    ///
    /// `index` is the element's position in that list and becomes the
    /// synthetic id when the record has none.
    fn from_cms(value: Value, index: usize) -> Result<Self>;

    fn id(&self) -> EntityId;

    fn slug(&self) -> &str;
}

/// Decode a CMS list response
///
/// A body that is not an array yields an empty collection. Records that fail
/// to decode are skipped with a warning instead of failing the whole list.
pub fn decode_collection<T: CmsEntity>(body: Value) -> Vec<T> {
    let Value::Array(items) = body else {
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match T::from_cms(item, index) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable CMS record");
                None
            }
        })
        .collect()
}

/// Unwrap a detail-by-slug response (an array of zero or one records)
pub fn decode_single<T: CmsEntity>(body: Value) -> Option<T> {
    decode_collection(body).into_iter().next()
}

// ============================================================================
// Works
// ============================================================================

/// A single artwork
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub acf: WorkFields,
    /// First embedded media source URL
    pub image_url: Option<String>,
}

/// Work attribute bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkFields {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub medium: Option<String>,
    /// Name of the exhibition the work was shown in (free text)
    #[serde(default, deserialize_with = "de::opt_string")]
    pub exhibition: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dimensions: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub materials: Option<String>,
}

impl WorkItem {
    /// Year used for ordering; missing years sort as 0
    pub fn sort_year(&self) -> i32 {
        self.acf.year.unwrap_or(0)
    }
}

// ============================================================================
// Exhibitions
// ============================================================================

/// An exhibition with its images and loose work references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhibitionItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub date: Option<String>,
    pub acf: ExhibitionFields,
}

/// Exhibition attribute bag
///
/// `image_N` and `work_N` are fixed CMS slots. `work_N` holds free text that
/// is compared against work titles, not an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionFields {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub exhibition_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub credits: Option<String>,

    #[serde(default, deserialize_with = "de::image_url")]
    pub image_1: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_2: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_3: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_4: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_5: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_6: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_7: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_8: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_9: Option<String>,
    #[serde(default, deserialize_with = "de::image_url")]
    pub image_10: Option<String>,

    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_1: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_2: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_3: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_4: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_5: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_6: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_7: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_8: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_9: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub work_10: Option<String>,
}

impl ExhibitionFields {
    /// Filled work reference slots, in slot order
    pub fn work_references(&self) -> Vec<&str> {
        [
            &self.work_1,
            &self.work_2,
            &self.work_3,
            &self.work_4,
            &self.work_5,
            &self.work_6,
            &self.work_7,
            &self.work_8,
            &self.work_9,
            &self.work_10,
        ]
        .into_iter()
        .filter_map(|slot| slot.as_deref())
        .collect()
    }
}

impl ExhibitionItem {
    /// Calendar year of `start_date`
    pub fn start_year(&self) -> Option<i32> {
        self.acf.start_date.as_deref().and_then(calendar_year)
    }
}

/// Reduced exhibition projection used by the textual exhibition index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhibitionListItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub acf: ExhibitionListFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionListFields {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub exhibition_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub city: Option<String>,
}

// ============================================================================
// Info records
// ============================================================================

/// Education entry (degree, course, residency)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub acf: EducationFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationFields {
    /// Year or year range as entered ("2014", "2014–2017")
    #[serde(default, deserialize_with = "de::opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
}

/// Grant or award entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub acf: GrantFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantFields {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub grantor: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
}

/// Biography section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiographyItem {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub acf: BiographyFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiographyFields {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub born: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub lives_and_works: Option<String>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Envelope shared by every CMS post type
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "A: serde::de::DeserializeOwned + Default"))]
struct RawRecord<A> {
    #[serde(default, deserialize_with = "de::opt_u64")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "de::string_or_empty")]
    slug: String,
    #[serde(default, deserialize_with = "de::rendered")]
    title: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    date: Option<String>,
    #[serde(default, deserialize_with = "de::attributes")]
    acf: A,
    #[serde(default, rename = "_embedded")]
    embedded: Option<Value>,
}

impl<A> RawRecord<A> {
    fn featured_media_url(&self) -> Option<String> {
        self.embedded
            .as_ref()?
            .pointer("/wp:featuredmedia/0/source_url")?
            .as_str()
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

macro_rules! cms_identity {
    () => {
        fn id(&self) -> EntityId {
            self.id
        }

        fn slug(&self) -> &str {
            &self.slug
        }
    };
}

impl CmsEntity for WorkItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<WorkFields> = serde_json::from_value(value)?;
        let image_url = raw.featured_media_url();
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            acf: raw.acf,
            image_url,
        })
    }

    cms_identity!();
}

impl CmsEntity for ExhibitionItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<ExhibitionFields> = serde_json::from_value(value)?;
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            date: raw.date,
            acf: raw.acf,
        })
    }

    cms_identity!();
}

impl CmsEntity for ExhibitionListItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<ExhibitionListFields> = serde_json::from_value(value)?;
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            acf: raw.acf,
        })
    }

    cms_identity!();
}

impl CmsEntity for EducationItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<EducationFields> = serde_json::from_value(value)?;
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            acf: raw.acf,
        })
    }

    cms_identity!();
}

impl CmsEntity for GrantItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<GrantFields> = serde_json::from_value(value)?;
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            acf: raw.acf,
        })
    }

    cms_identity!();
}

impl CmsEntity for BiographyItem {
    fn from_cms(value: Value, index: usize) -> Result<Self> {
        let raw: RawRecord<BiographyFields> = serde_json::from_value(value)?;
        Ok(Self {
            id: EntityId::from_raw(raw.id, index),
            slug: raw.slug,
            title: raw.title,
            acf: raw.acf,
        })
    }

    cms_identity!();
}

/// Date formats the CMS date pickers have been seen to emit
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Written-out dates ("May 3, 2021", "3 May 2021"); English month names only
const NAMED_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%d %B %Y", "%B %d %Y"];

/// Extract the calendar year from a CMS date string
///
/// Falls back to a leading four-digit year for compact and partial dates
/// ("20210503", "2021-05").
pub fn calendar_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in NAMED_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.year());
        }
    }

    // Datetime strings ("2021-05-03 00:00:00", "2021-05-03T10:00:00")
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date.year());
        }
    }

    let year = raw
        .get(..4)
        .filter(|prefix| prefix.chars().all(|c| c.is_ascii_digit()))
        .and_then(|prefix| prefix.parse().ok());
    if year.is_none() {
        debug!(date = %raw, "Unrecognized date; record has no year");
    }
    year
}

/// Lenient field deserializers for CMS custom fields
mod de {
    use serde::de::{DeserializeOwned, Error as _};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Strings stay as-is (empty means absent), numbers are stringified,
    /// `false`/`null`/objects are absent.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    /// Title is either a bare string or `{ "rendered": "..." }`
    pub fn rendered<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Object(map) => map
                .get("rendered")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
    }

    /// Image field: `{ "url": ... }` object, bare URL, attachment id or `false`
    ///
    /// A bare attachment id carries no URL and is treated as absent.
    pub fn image_url<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => map
                .get("url")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
    }

    /// Attribute bag: the CMS sends `[]` or `false` for posts without fields
    pub fn attributes<'de, D, A>(d: D) -> Result<A, D::Error>
    where
        D: Deserializer<'de>,
        A: DeserializeOwned + Default,
    {
        match Value::deserialize(d)? {
            value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
            _ => Ok(A::default()),
        }
    }
}
