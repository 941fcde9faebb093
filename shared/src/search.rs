//! Catalog text search: token matching and candidate ranking
//!
//! Free text is split into whitespace tokens; a candidate matches only if
//! every token is a substring of its name, reference, or category (AND
//! semantics, so one common token cannot pull in unrelated items). The same
//! functions run server-side against the site catalog and in the browser
//! against the cached item list.

use crate::models::CatalogItem;
use crate::validation::is_generated_reference;

/// Split a query into lowercase whitespace-delimited tokens
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// True when every token is a substring of the name, reference, or category
pub fn matches_tokens(tokens: &[String], name: &str, reference: &str, category: Option<&str>) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let name = name.to_lowercase();
    let reference = reference.to_lowercase();
    let category = category.map(|c| c.to_lowercase()).unwrap_or_default();

    tokens
        .iter()
        .all(|t| name.contains(t) || reference.contains(t) || category.contains(t))
}

/// True when the item's reference or name equals the code, case-insensitively
pub fn is_exact_match(item: &CatalogItem, code: &str) -> bool {
    item.reference.eq_ignore_ascii_case(code) || item.name.eq_ignore_ascii_case(code)
}

/// Order search candidates for display.
///
/// Items whose reference was scanned or assigned by hand rank above ones
/// carrying a system-generated reference: a real reference is more likely to
/// be the physically correct item than a placeholder. Within the same rank,
/// most-recently-updated first.
pub fn rank_candidates(candidates: &mut [CatalogItem]) {
    candidates.sort_by(|a, b| {
        is_generated_reference(&a.reference)
            .cmp(&is_generated_reference(&b.reference))
            .then(b.updated_at.cmp(&a.updated_at))
    });
}

/// Filter and rank a list of items against a free-text query.
pub fn search_items(items: &[CatalogItem], query: &str) -> Vec<CatalogItem> {
    let tokens = tokenize(query);
    let mut matched: Vec<CatalogItem> = items
        .iter()
        .filter(|item| matches_tokens(&tokens, &item.name, &item.reference, item.category.as_deref()))
        .cloned()
        .collect();
    rank_candidates(&mut matched);
    matched
}

/// Resolve a code against a list of items: exact reference/name match wins
/// outright.
pub fn find_exact<'a>(items: &'a [CatalogItem], code: &str) -> Option<&'a CatalogItem> {
    items.iter().find(|item| is_exact_match(item, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn item(name: &str, reference: &str, category: Option<&str>, updated_offset_min: i64) -> CatalogItem {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        CatalogItem {
            id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            name: name.to_string(),
            reference: reference.to_string(),
            category: category.map(|c| c.to_string()),
            unit: "pièce".to_string(),
            quantity_on_hand: 10,
            minimum_quantity: 0,
            created_at: base,
            updated_at: base + Duration::minutes(updated_offset_min),
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("filtre  huile "), vec!["filtre", "huile"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_and_semantics() {
        let tokens = tokenize("filtre huile");
        assert!(matches_tokens(&tokens, "Filtre huile moteur", "FH-1", None));
        // One token matching is not enough
        assert!(!matches_tokens(&tokens, "Filtre à air", "FA-1", None));
    }

    #[test]
    fn test_tokens_match_across_fields() {
        let tokens = tokenize("filtre fh-99");
        assert!(matches_tokens(&tokens, "Filtre huile", "FH-998877", None));

        let tokens = tokenize("huile lubrifiant");
        assert!(matches_tokens(
            &tokens,
            "Huile 15W40",
            "HU-15",
            Some("Lubrifiants")
        ));
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let items = vec![item("Filtre huile", "FH-1", None, 0)];
        assert!(search_items(&items, "   ").is_empty());
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let items = vec![
            item("Filtre huile", "FH-998877", None, 0),
            item("Courroie", "CR-1122", None, 0),
        ];
        assert!(find_exact(&items, "fh-998877").is_some());
        assert!(find_exact(&items, "COURROIE").is_some());
        assert!(find_exact(&items, "FH-99").is_none());
    }

    #[test]
    fn test_scanned_reference_ranks_above_generated() {
        let items = vec![
            item("Filtre huile", "STK-001", None, 60),
            item("Filtre huile", "FH-998877", None, 0),
        ];
        let results = search_items(&items, "filtre huile");
        assert_eq!(results.len(), 2);
        // The generated-looking reference loses even though it is fresher
        assert_eq!(results[0].reference, "FH-998877");
        assert_eq!(results[1].reference, "STK-001");
    }

    #[test]
    fn test_recency_breaks_ties_within_rank() {
        let items = vec![
            item("Filtre huile A", "FH-1", None, 0),
            item("Filtre huile B", "FH-2", None, 30),
        ];
        let results = search_items(&items, "filtre");
        assert_eq!(results[0].reference, "FH-2");
        assert_eq!(results[1].reference, "FH-1");
    }
}
