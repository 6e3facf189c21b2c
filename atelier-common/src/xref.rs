//! Exhibition to work cross-references
//!
//! Exhibitions name the works they showed in free-text `work_N` slots. The
//! CMS has no foreign key between the two, so references are resolved by
//! title: trimmed, case-insensitive string equality. This is approximate.
//! Works sharing a title resolve to the first one in collection order, and
//! a typo in either title leaves the reference unresolved.

use serde::Serialize;

use crate::entities::{ExhibitionItem, WorkItem};

/// Best-effort lookup of a work by its title
pub fn find_work_by_title<'a>(works: &'a [WorkItem], reference: &str) -> Option<&'a WorkItem> {
    let wanted = normalize(reference);
    if wanted.is_empty() {
        return None;
    }
    works.iter().find(|work| normalize(&work.title) == wanted)
}

/// One exhibition work reference and the work it resolved to, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReference {
    pub reference: String,
    pub work: Option<WorkItem>,
}

/// Resolve every filled `work_N` slot of an exhibition, in slot order
pub fn resolve_work_references(
    exhibition: &ExhibitionItem,
    works: &[WorkItem],
) -> Vec<ResolvedReference> {
    exhibition
        .acf
        .work_references()
        .into_iter()
        .map(|reference| ResolvedReference {
            reference: reference.to_string(),
            work: find_work_by_title(works, reference).cloned(),
        })
        .collect()
}

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityId, ExhibitionFields, WorkFields};

    fn work(id: u64, title: &str) -> WorkItem {
        WorkItem {
            id: EntityId::Stable(id),
            slug: format!("work-{}", id),
            title: title.to_string(),
            acf: WorkFields::default(),
            image_url: None,
        }
    }

    #[test]
    fn test_match_ignores_case_and_surrounding_space() {
        let works = vec![work(1, "Gul Himmel"), work(2, "Örn")];
        assert_eq!(
            find_work_by_title(&works, "  gul himmel ").map(|w| w.id),
            Some(EntityId::Stable(1))
        );
        assert_eq!(find_work_by_title(&works, "ÖRN").map(|w| w.id), Some(EntityId::Stable(2)));
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first() {
        let works = vec![work(5, "Utan titel"), work(6, "Utan titel")];
        assert_eq!(
            find_work_by_title(&works, "utan titel").map(|w| w.id),
            Some(EntityId::Stable(5))
        );
    }

    #[test]
    fn test_no_match_or_blank_reference() {
        let works = vec![work(1, "Gul Himmel")];
        assert!(find_work_by_title(&works, "Gul Himmel II").is_none());
        assert!(find_work_by_title(&works, "   ").is_none());
    }

    #[test]
    fn test_resolve_references_keeps_unresolved_entries() {
        let works = vec![work(1, "Gul Himmel"), work(2, "Björk")];
        let exhibition = ExhibitionItem {
            id: EntityId::Stable(10),
            slug: "vinter".to_string(),
            title: "Vinter".to_string(),
            date: None,
            acf: ExhibitionFields {
                work_1: Some("björk".to_string()),
                work_3: Some("Försvunnen".to_string()),
                ..Default::default()
            },
        };

        let resolved = resolve_work_references(&exhibition, &works);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].reference, "björk");
        assert_eq!(resolved[0].work.as_ref().map(|w| w.id), Some(EntityId::Stable(2)));
        assert_eq!(resolved[1].reference, "Försvunnen");
        assert!(resolved[1].work.is_none());
    }
}
