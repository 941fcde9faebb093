//! Scan confirmation tests
//!
//! Tests for the majority-vote debouncer:
//! - Voting threshold and single emission
//! - Input filter (malformed codes never reach voting)
//! - Window reset semantics
//! - Candidate tally bounds

use proptest::prelude::*;
use shared::scan::{CandidateTally, ScanConfig, ScanEngine, ScanOutcome, ScanPolicy};
use shared::validation::{validate_numeric_code, validate_scan_code};

fn default_engine() -> ScanEngine {
    ScanEngine::new(ScanConfig::default())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The reference stream: window 3, threshold 2
    #[test]
    fn test_voting_threshold_reference_stream() {
        let mut engine = default_engine();

        assert!(matches!(
            engine.submit("ABC123"),
            ScanOutcome::Pending { support: 1, needed: 2 }
        ));
        assert!(matches!(
            engine.submit("XYZ000"),
            ScanOutcome::Pending { support: 1, needed: 2 }
        ));
        // Third submission reaches 2-of-3 for ABC123
        assert_eq!(
            engine.submit("ABC123"),
            ScanOutcome::Confirmed {
                code: "ABC123".to_string()
            }
        );
    }

    /// A 4th identical submission does not re-emit without a fresh window
    #[test]
    fn test_no_reemission_after_confirmation() {
        let mut engine = default_engine();
        engine.submit("ABC123");
        engine.submit("XYZ000");
        let confirmed = engine.submit("ABC123");
        assert!(matches!(confirmed, ScanOutcome::Confirmed { .. }));

        // The window was cleared on emission
        assert_eq!(engine.window_len(), 0);
        assert!(matches!(
            engine.submit("ABC123"),
            ScanOutcome::Pending { support: 1, .. }
        ));
    }

    /// Malformed codes are rejected and never enter the window
    #[test]
    fn test_malformed_codes_rejected() {
        let mut engine = default_engine();

        for code in ["", "00000", "AB", "a b c!"] {
            assert!(
                matches!(engine.submit(code), ScanOutcome::Rejected { .. }),
                "expected rejection for {:?}",
                code
            );
            assert_eq!(engine.window_len(), 0);
        }
    }

    /// Two rejected reads between two good reads do not break confirmation
    #[test]
    fn test_noise_interleaved_with_good_reads() {
        let mut engine = default_engine();
        engine.submit("FH-998877");
        engine.submit("00000");
        engine.submit("AB");
        assert!(matches!(
            engine.submit("FH-998877"),
            ScanOutcome::Confirmed { .. }
        ));
    }

    /// Reset drops all evidence instantly
    #[test]
    fn test_reset_between_captures() {
        let mut engine = default_engine();
        engine.submit("ABC123");
        engine.reset();
        assert!(matches!(
            engine.submit("ABC123"),
            ScanOutcome::Pending { support: 1, .. }
        ));
    }

    /// Three distinct codes never confirm with threshold 2
    #[test]
    fn test_disagreeing_window_stays_pending() {
        let mut engine = default_engine();
        assert!(matches!(engine.submit("AAA111"), ScanOutcome::Pending { .. }));
        assert!(matches!(engine.submit("BBB222"), ScanOutcome::Pending { .. }));
        assert!(matches!(engine.submit("CCC333"), ScanOutcome::Pending { .. }));
    }

    /// The strict numeric policy is a configuration, not a second engine
    #[test]
    fn test_numeric_strict_policy_rejects_alphanumerics() {
        let mut engine = ScanEngine::new(ScanConfig {
            window_size: 3,
            threshold: 2,
            policy: ScanPolicy::NumericStrict,
        });

        assert!(matches!(engine.submit("ABC123"), ScanOutcome::Rejected { .. }));
        engine.submit("96385074");
        assert!(matches!(
            engine.submit("96385074"),
            ScanOutcome::Confirmed { .. }
        ));
    }

    #[test]
    fn test_filter_boundaries() {
        // 4 and 20 characters are accepted; 3 and 21 are not
        assert!(validate_scan_code("A123").is_ok());
        assert!(validate_scan_code(&"A1".repeat(10)).is_ok());
        assert!(validate_scan_code("A12").is_err());
        assert!(validate_scan_code(&"A123456789012345678901"[..21]).is_err());
    }

    #[test]
    fn test_numeric_filter_requires_check_digit() {
        assert!(validate_numeric_code("7622210449283").is_ok());
        assert!(validate_numeric_code("7622210449284").is_err());
    }

    #[test]
    fn test_tally_ranked_and_bounded() {
        let mut tally = CandidateTally::new(3);
        for _ in 0..3 {
            tally.record("AAA111");
        }
        tally.record("BBB222");
        tally.record("CCC333");
        tally.record("DDD444"); // evicts one of the count-1 entries

        assert_eq!(tally.len(), 3);
        let ranked = tally.ranked();
        assert_eq!(ranked[0], ("AAA111".to_string(), 3));
    }

    #[test]
    fn test_tally_select_is_terminal() {
        let mut tally = CandidateTally::default();
        tally.record("AAA111");
        assert_eq!(tally.select("AAA111"), Some("AAA111".to_string()));
        assert!(tally.is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for well-formed codes
    fn code_strategy() -> impl Strategy<Value = String> {
        "[A-Z]{2}[0-9]{4}".prop_filter("repeated-char noise", |c| {
            validate_scan_code(c).is_ok()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Submitting the same valid code twice always confirms it
        #[test]
        fn prop_two_identical_reads_confirm(code in code_strategy()) {
            let mut engine = default_engine();
            engine.submit(&code);
            let outcome = engine.submit(&code);
            prop_assert_eq!(outcome, ScanOutcome::Confirmed { code });
        }

        /// A confirmed code always passed the input filter
        #[test]
        fn prop_confirmed_codes_are_valid(raws in prop::collection::vec(".{0,24}", 1..30)) {
            let mut engine = default_engine();
            for raw in &raws {
                if let ScanOutcome::Confirmed { code } = engine.submit(raw) {
                    prop_assert!(validate_scan_code(&code).is_ok());
                }
            }
        }

        /// The window never grows beyond its configured size
        #[test]
        fn prop_window_bounded(raws in prop::collection::vec("[A-Z0-9]{4,8}", 1..50)) {
            let mut engine = default_engine();
            for raw in &raws {
                engine.submit(raw);
                prop_assert!(engine.window_len() <= 3);
            }
        }

        /// Interleaved noise never produces a confirmation of a noise code
        #[test]
        fn prop_noise_never_confirms(
            code in code_strategy(),
            noise in prop::collection::vec(prop_oneof![Just("00000"), Just("AB"), Just("!bad!")], 1..5)
        ) {
            let mut engine = default_engine();
            engine.submit(&code);
            for n in &noise {
                match engine.submit(n) {
                    ScanOutcome::Confirmed { code: confirmed } => {
                        // Only the valid code may ever confirm
                        prop_assert_eq!(&confirmed, &code);
                    }
                    _ => {}
                }
            }
        }

        /// The tally never exceeds its capacity
        #[test]
        fn prop_tally_bounded(
            codes in prop::collection::vec("[A-Z]{3}[0-9]{3}", 1..100),
            capacity in 1usize..10
        ) {
            let mut tally = CandidateTally::new(capacity);
            for code in &codes {
                tally.record(code);
                prop_assert!(tally.len() <= capacity);
            }
        }
    }
}
