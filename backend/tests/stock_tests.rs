//! Stock ledger tests
//!
//! Tests for the adjustment guard (quantity never goes negative, all or
//! nothing), the append-only movement log, and threshold alerts.

use proptest::prelude::*;

// ============================================================================
// Integration Test Helpers (mirror of the ledger's conditional update)
// ============================================================================

/// Simulate the conditional adjustment the store performs:
/// `UPDATE ... WHERE quantity_on_hand + delta >= 0`
fn simulate_adjust(current: i64, delta: i64) -> Result<i64, &'static str> {
    if delta == 0 {
        return Err("Delta cannot be zero");
    }
    let next = current + delta;
    if next < 0 {
        return Err("Insufficient stock");
    }
    Ok(next)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_adjust_in() {
        assert_eq!(simulate_adjust(10, 5), Ok(15));
        assert_eq!(simulate_adjust(0, 3), Ok(3));
    }

    #[test]
    fn test_adjust_out() {
        assert_eq!(simulate_adjust(10, -4), Ok(6));
        assert_eq!(simulate_adjust(10, -10), Ok(0));
    }

    #[test]
    fn test_adjust_never_negative() {
        assert!(simulate_adjust(10, -11).is_err());
        assert!(simulate_adjust(0, -1).is_err());
    }

    #[test]
    fn test_zero_delta_rejected() {
        assert!(simulate_adjust(10, 0).is_err());
    }

    /// One movement per successful adjustment; failures append nothing
    #[test]
    fn test_movement_appended_only_on_success() {
        let mut quantity = 5i64;
        let mut movements: Vec<i64> = Vec::new();

        for delta in [3, -6, -10, 4] {
            if let Ok(next) = simulate_adjust(quantity, delta) {
                quantity = next;
                movements.push(delta);
            }
        }

        // -10 was refused at quantity 2
        assert_eq!(movements, vec![3, -6, 4]);
        assert_eq!(quantity, 6);
    }

    /// Net change over a window is the sum of deltas in that window
    #[test]
    fn test_net_change_reconstruction() {
        let movements = [(1, 10i64), (2, -4), (5, 7), (9, -2)];

        let net_all: i64 = movements.iter().map(|(_, d)| d).sum();
        assert_eq!(net_all, 11);

        let net_window: i64 = movements
            .iter()
            .filter(|(day, _)| (2..=5).contains(day))
            .map(|(_, d)| d)
            .sum();
        assert_eq!(net_window, 3);
    }

    /// Threshold alert fires at or below the minimum
    #[test]
    fn test_below_minimum_boundary() {
        fn is_below(quantity: i64, minimum: i64) -> bool {
            quantity <= minimum
        }

        assert!(is_below(3, 5));
        assert!(is_below(5, 5));
        assert!(!is_below(6, 5));
        assert!(!is_below(1, 0));
        assert!(is_below(0, 0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Quantity is never negative after any sequence of adjustments
        #[test]
        fn prop_quantity_never_negative(
            initial in 0i64..1000,
            deltas in prop::collection::vec(-100i64..100, 1..50)
        ) {
            let mut quantity = initial;
            for delta in &deltas {
                if let Ok(next) = simulate_adjust(quantity, *delta) {
                    quantity = next;
                }
                prop_assert!(quantity >= 0);
            }
        }

        /// The final quantity equals the initial plus all applied deltas
        #[test]
        fn prop_ledger_sums_to_quantity(
            initial in 0i64..1000,
            deltas in prop::collection::vec(-100i64..100, 1..50)
        ) {
            let mut quantity = initial;
            let mut movements: Vec<i64> = Vec::new();

            for delta in &deltas {
                if let Ok(next) = simulate_adjust(quantity, *delta) {
                    quantity = next;
                    movements.push(*delta);
                }
            }

            let net: i64 = movements.iter().sum();
            prop_assert_eq!(initial + net, quantity);
        }

        /// An adjustment either fully applies or changes nothing
        #[test]
        fn prop_all_or_nothing(current in 0i64..100, delta in -200i64..200) {
            match simulate_adjust(current, delta) {
                Ok(next) => prop_assert_eq!(next, current + delta),
                Err(_) => {
                    // The caller's view of `current` is untouched on failure
                    prop_assert!(delta == 0 || current + delta < 0);
                }
            }
        }

        /// Splitting one adjustment into two applied parts is equivalent
        #[test]
        fn prop_adjustments_compose(initial in 0i64..1000, a in 1i64..100, b in 1i64..100) {
            let combined = simulate_adjust(initial, a + b).unwrap();
            let split = simulate_adjust(simulate_adjust(initial, a).unwrap(), b).unwrap();
            prop_assert_eq!(combined, split);
        }
    }
}
