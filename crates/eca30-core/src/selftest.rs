//! Startup self-test against the canonical Rule 30 vector.
//!
//! The canonical state is cell 0 set followed by 257 generations. Any correct
//! implementation of the ring and the transition reproduces it bit for bit.

use serde::Serialize;

use crate::automaton::{bootstrap_pool, rule30};
use crate::ring::{BitRing, POOL_WORDS};

/// Pool words after the deterministic bootstrap.
pub const REFERENCE_WORDS: [u64; POOL_WORDS] = [
    0x6513_ec34_b3da_0a14,
    0x1432_30fe_be87_0e01,
    0x98de_b2e7_71dd_7235,
    0xf0dc_74fd_471d_9f07,
    0x0000_0000_0000_0001,
];

/// Outcome of one self-test check.
#[derive(Debug, Clone, Serialize)]
pub struct SelfTestCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Outcome of the full self-test.
#[derive(Debug, Clone, Serialize)]
pub struct SelfTestReport {
    pub passed: bool,
    pub checks: Vec<SelfTestCheck>,
}

fn check(name: &'static str, passed: bool, detail: String) -> SelfTestCheck {
    SelfTestCheck {
        name,
        passed,
        detail,
    }
}

/// Run every check.
pub fn run() -> SelfTestReport {
    let mut checks = Vec::new();

    let one = rule30(&BitRing::with_bit(0));
    checks.push(check(
        "single_step",
        one.words() == &[0b11, 0, 0, 0, 1],
        format!("{one:?}"),
    ));

    let boot = bootstrap_pool();
    let round_trip =
        boot.rotate_right().rotate_left() == boot && boot.rotate_left().rotate_right() == boot;
    checks.push(check(
        "rotation_round_trip",
        round_trip,
        format!("{} live cells", boot.count_ones()),
    ));

    let reference = BitRing::from_words(REFERENCE_WORDS);
    checks.push(check(
        "canonical_vector",
        boot == reference,
        format!("got {boot:?}, want {reference:?}"),
    ));

    let drained = rule30(&BitRing::ones());
    let fixed = rule30(&BitRing::zeroed());
    checks.push(check(
        "zero_fixed_point",
        !drained.is_nonzero() && !fixed.is_nonzero(),
        "all-ones steps to zero, zero stays zero".to_string(),
    ));

    let passed = checks.iter().all(|c| c.passed);
    if !passed {
        log::error!("rule30 self-test failed: {checks:?}");
    }
    SelfTestReport { passed, checks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes() {
        let report = run();
        assert!(report.passed, "{report:?}");
        assert_eq!(report.checks.len(), 4);
    }

    #[test]
    fn test_reference_words_are_masked() {
        assert_eq!(BitRing::from_words(REFERENCE_WORDS).words(), &REFERENCE_WORDS);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(run()).unwrap();
        assert_eq!(json["passed"], true);
        assert_eq!(json["checks"][2]["name"], "canonical_vector");
    }
}
