//! Container lifecycle tests
//!
//! Tests for identifier uniqueness, the one-way open/closed transition, and
//! on-demand aggregates.

use proptest::prelude::*;
use shared::models::ContainerStatus;
use shared::validation::validate_container_identifier;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Mirrors the service's duplicate check: case-insensitive within one
    /// preparation
    fn is_duplicate(existing: &[&str], candidate: &str) -> bool {
        existing
            .iter()
            .any(|id| id.to_lowercase() == candidate.to_lowercase())
    }

    /// "C001" then "c001" in the same preparation: the second is a duplicate
    #[test]
    fn test_duplicate_identifier_case_insensitive() {
        let existing = ["C001"];
        assert!(is_duplicate(&existing, "c001"));
        assert!(is_duplicate(&existing, "C001"));
        assert!(!is_duplicate(&existing, "C002"));
    }

    /// The same identifier in another preparation is not a duplicate
    #[test]
    fn test_identifier_scope_is_per_preparation() {
        let preparation_a = ["C001"];
        let preparation_b: [&str; 0] = [];
        assert!(is_duplicate(&preparation_a, "c001"));
        assert!(!is_duplicate(&preparation_b, "c001"));
    }

    #[test]
    fn test_identifier_format() {
        assert!(validate_container_identifier("C001").is_ok());
        assert!(validate_container_identifier("CAISSE-07").is_ok());
        assert!(validate_container_identifier("").is_err());
        assert!(validate_container_identifier("C 001").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(ContainerStatus::parse("open"), Some(ContainerStatus::Open));
        assert_eq!(
            ContainerStatus::parse("closed"),
            Some(ContainerStatus::Closed)
        );
        assert_eq!(ContainerStatus::parse("reopened"), None);
        assert_eq!(ContainerStatus::Open.as_str(), "open");
        assert_eq!(ContainerStatus::Closed.as_str(), "closed");
    }

    /// The only legal transition is open -> closed; closed is terminal
    #[test]
    fn test_one_way_transition() {
        fn can_transition(from: ContainerStatus, to: ContainerStatus) -> bool {
            from == ContainerStatus::Open && to == ContainerStatus::Closed
        }

        assert!(can_transition(ContainerStatus::Open, ContainerStatus::Closed));
        assert!(!can_transition(ContainerStatus::Closed, ContainerStatus::Open));
        assert!(!can_transition(ContainerStatus::Closed, ContainerStatus::Closed));
        assert!(!can_transition(ContainerStatus::Open, ContainerStatus::Open));
    }

    /// Aggregates are a fold over the lines, never a stored counter
    #[test]
    fn test_totals_computed_from_lines() {
        let lines: Vec<i64> = vec![4, 1, 7];
        let line_count = lines.len() as i64;
        let total_quantity: i64 = lines.iter().sum();

        assert_eq!(line_count, 3);
        assert_eq!(total_quantity, 12);

        let empty: Vec<i64> = Vec::new();
        assert_eq!(empty.iter().sum::<i64>(), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Case-insensitive equality is symmetric: if A duplicates B then B
        /// duplicates A
        #[test]
        fn prop_duplicate_check_symmetric(a in "[A-Za-z0-9_-]{1,10}", b in "[A-Za-z0-9_-]{1,10}") {
            let ab = a.to_lowercase() == b.to_lowercase();
            let ba = b.to_lowercase() == a.to_lowercase();
            prop_assert_eq!(ab, ba);
        }

        /// Any case variant of an accepted identifier is also accepted
        #[test]
        fn prop_identifier_validation_case_blind(id in "[A-Za-z0-9_-]{1,30}") {
            let upper = id.to_uppercase();
            let lower = id.to_lowercase();
            prop_assert_eq!(
                validate_container_identifier(&upper).is_ok(),
                validate_container_identifier(&lower).is_ok()
            );
        }

        /// Totals over any set of positive lines are positive and additive
        #[test]
        fn prop_totals_additive(lines in prop::collection::vec(1i64..1000, 0..20)) {
            let total: i64 = lines.iter().sum();
            let split = lines.len() / 2;
            let first: i64 = lines[..split].iter().sum();
            let second: i64 = lines[split..].iter().sum();
            prop_assert_eq!(total, first + second);
            prop_assert!(lines.is_empty() || total > 0);
        }
    }
}
