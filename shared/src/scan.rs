//! Scan confirmation engine
//!
//! Single-frame recognition from a live camera is noisy (motion blur, partial
//! occlusion), so raw candidates are debounced by majority vote over a short
//! sliding window before anything downstream sees them. The engine is plain
//! state with no I/O; the browser drives it through the WASM bindings and the
//! backend reuses the same filter for manual entry.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::validation::{validate_numeric_code, validate_scan_code};

/// Validation policy applied before a candidate may enter the voting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    /// General alphanumeric codes (canonical policy)
    #[default]
    Alphanumeric,
    /// Digits only, EAN-8/EAN-13 length and check digit
    NumericStrict,
}

impl ScanPolicy {
    pub fn validate(&self, code: &str) -> Result<(), &'static str> {
        match self {
            ScanPolicy::Alphanumeric => validate_scan_code(code),
            ScanPolicy::NumericStrict => validate_numeric_code(code),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPolicy::Alphanumeric => "alphanumeric",
            ScanPolicy::NumericStrict => "numeric_strict",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of admitted candidates kept in the sliding window
    pub window_size: usize,
    /// Minimum identical detections required to confirm
    pub threshold: usize,
    pub policy: ScanPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            threshold: 2,
            policy: ScanPolicy::Alphanumeric,
        }
    }
}

impl ScanConfig {
    /// Clamp threshold into `1..=window_size` so a misconfigured engine can
    /// still confirm.
    pub fn normalized(mut self) -> Self {
        if self.window_size == 0 {
            self.window_size = 1;
        }
        self.threshold = self.threshold.clamp(1, self.window_size);
        self
    }
}

/// Outcome of submitting one raw candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The candidate reached the voting threshold; emitted exactly once
    Confirmed { code: String },
    /// Not enough consistent evidence yet; `support` is the count of the
    /// current front-runner so the UI can show progress
    Pending { support: usize, needed: usize },
    /// Failed the input filter; never entered the window
    Rejected { reason: String },
}

/// Majority-vote debouncer over the last `window_size` admitted candidates.
///
/// Stateless apart from its window; `reset` clears it instantly when the
/// capture session restarts. A confirmed code clears the window, so the same
/// code is never re-emitted without a fresh window of evidence.
#[derive(Debug, Clone)]
pub struct ScanEngine {
    config: ScanConfig,
    window: VecDeque<String>,
}

impl ScanEngine {
    pub fn new(config: ScanConfig) -> Self {
        let config = config.normalized();
        let window = VecDeque::with_capacity(config.window_size);
        Self { config, window }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Submit one raw candidate string from the decode source.
    pub fn submit(&mut self, raw: &str) -> ScanOutcome {
        let code = raw.trim();
        if let Err(reason) = self.config.policy.validate(code) {
            return ScanOutcome::Rejected {
                reason: reason.to_string(),
            };
        }

        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(code.to_string());

        let (winner, support) = match self.front_runner() {
            Some(v) => v,
            None => {
                return ScanOutcome::Pending {
                    support: 0,
                    needed: self.config.threshold,
                }
            }
        };

        if support >= self.config.threshold {
            self.window.clear();
            ScanOutcome::Confirmed { code: winner }
        } else {
            ScanOutcome::Pending {
                support,
                needed: self.config.threshold,
            }
        }
    }

    /// Clear the voting window (capture session restart)
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Number of candidates currently in the window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Most frequent value in the window and its count. Earliest-seen wins
    /// ties so the outcome is deterministic.
    fn front_runner(&self) -> Option<(String, usize)> {
        let mut best: Option<(String, usize)> = None;
        for code in &self.window {
            let count = self.window.iter().filter(|c| *c == code).count();
            match &best {
                Some((_, best_count)) if *best_count >= count => {}
                _ => best = Some((code.clone(), count)),
            }
        }
        best
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Bounded tally of detected candidate codes for operator disambiguation.
///
/// Used by the multi-code confirmation flow: every admitted candidate bumps a
/// counter, the UI shows the ranked list, and the operator picks one to
/// confirm. When full, a new code evicts the weakest entry.
#[derive(Debug, Clone)]
pub struct CandidateTally {
    capacity: usize,
    entries: Vec<(String, usize)>,
}

impl CandidateTally {
    pub const DEFAULT_CAPACITY: usize = 8;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// Record one detection of `code`; returns its updated count.
    pub fn record(&mut self, code: &str) -> usize {
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| c == code) {
            entry.1 += 1;
            return entry.1;
        }

        if self.entries.len() == self.capacity {
            // Evict the weakest candidate to make room
            if let Some(weakest) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, count))| *count)
                .map(|(i, _)| i)
            {
                self.entries.remove(weakest);
            }
        }
        self.entries.push((code.to_string(), 1));
        1
    }

    /// Candidates ordered by count descending, then first-seen
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Operator picks a candidate; returns it and clears the tally.
    pub fn select(&mut self, code: &str) -> Option<String> {
        let found = self.entries.iter().any(|(c, _)| c == code);
        if found {
            self.entries.clear();
            Some(code.to_string())
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CandidateTally {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScanEngine {
        ScanEngine::default()
    }

    #[test]
    fn test_confirms_on_majority() {
        let mut e = engine();
        assert!(matches!(
            e.submit("ABC123"),
            ScanOutcome::Pending { support: 1, .. }
        ));
        assert!(matches!(
            e.submit("XYZ000"),
            ScanOutcome::Pending { support: 1, .. }
        ));
        assert_eq!(
            e.submit("ABC123"),
            ScanOutcome::Confirmed {
                code: "ABC123".to_string()
            }
        );
    }

    #[test]
    fn test_no_reemission_without_new_evidence() {
        let mut e = engine();
        e.submit("ABC123");
        e.submit("ABC123");
        // Window was cleared by the confirmation: a single further read is
        // only Pending again
        assert!(matches!(
            e.submit("ABC123"),
            ScanOutcome::Pending { support: 1, .. }
        ));
        assert!(matches!(e.submit("ABC123"), ScanOutcome::Confirmed { .. }));
    }

    #[test]
    fn test_rejected_codes_never_enter_window() {
        let mut e = engine();
        for noise in ["", "00000", "AB", "a b c!"] {
            assert!(matches!(e.submit(noise), ScanOutcome::Rejected { .. }));
        }
        assert_eq!(e.window_len(), 0);
    }

    #[test]
    fn test_window_slides() {
        let mut e = engine();
        e.submit("AAA111");
        e.submit("BBB222");
        e.submit("CCC333");
        // Window is now [BBB222, CCC333, DDD444]: AAA111 fell out
        assert!(matches!(
            e.submit("DDD444"),
            ScanOutcome::Pending { support: 1, .. }
        ));
        assert!(matches!(e.submit("DDD444"), ScanOutcome::Confirmed { .. }));
    }

    #[test]
    fn test_reset_clears_window() {
        let mut e = engine();
        e.submit("ABC123");
        e.reset();
        assert_eq!(e.window_len(), 0);
        assert!(matches!(
            e.submit("ABC123"),
            ScanOutcome::Pending { support: 1, .. }
        ));
    }

    #[test]
    fn test_trims_whitespace_before_validation() {
        let mut e = engine();
        assert!(matches!(
            e.submit("  ABC123  "),
            ScanOutcome::Pending { support: 1, .. }
        ));
        assert!(matches!(e.submit("ABC123"), ScanOutcome::Confirmed { .. }));
    }

    #[test]
    fn test_numeric_strict_policy() {
        let mut e = ScanEngine::new(ScanConfig {
            policy: ScanPolicy::NumericStrict,
            ..ScanConfig::default()
        });
        assert!(matches!(e.submit("ABC123"), ScanOutcome::Rejected { .. }));
        assert!(matches!(
            e.submit("7622210449283"),
            ScanOutcome::Pending { .. }
        ));
        assert!(matches!(
            e.submit("7622210449283"),
            ScanOutcome::Confirmed { .. }
        ));
    }

    #[test]
    fn test_config_normalization() {
        let config = ScanConfig {
            window_size: 3,
            threshold: 10,
            policy: ScanPolicy::Alphanumeric,
        }
        .normalized();
        assert_eq!(config.threshold, 3);

        let config = ScanConfig {
            window_size: 0,
            threshold: 0,
            policy: ScanPolicy::Alphanumeric,
        }
        .normalized();
        assert_eq!(config.window_size, 1);
        assert_eq!(config.threshold, 1);
    }

    #[test]
    fn test_tally_counts_and_ranking() {
        let mut t = CandidateTally::default();
        t.record("AAA111");
        t.record("BBB222");
        t.record("BBB222");
        let ranked = t.ranked();
        assert_eq!(ranked[0], ("BBB222".to_string(), 2));
        assert_eq!(ranked[1], ("AAA111".to_string(), 1));
    }

    #[test]
    fn test_tally_bounded_eviction() {
        let mut t = CandidateTally::new(2);
        t.record("AAA111");
        t.record("AAA111");
        t.record("BBB222");
        t.record("CCC333"); // Evicts BBB222, the weakest
        let ranked = t.ranked();
        assert_eq!(t.len(), 2);
        assert!(ranked.iter().any(|(c, _)| c == "AAA111"));
        assert!(ranked.iter().any(|(c, _)| c == "CCC333"));
    }

    #[test]
    fn test_tally_select_confirms_and_clears() {
        let mut t = CandidateTally::default();
        t.record("AAA111");
        t.record("BBB222");
        assert_eq!(t.select("AAA111"), Some("AAA111".to_string()));
        assert!(t.is_empty());
        assert_eq!(t.select("AAA111"), None);
    }
}
