//! Snap requested analog settings onto the discrete values the hardware accepts.
//!
//! Scale, range, and ratio registers on bench instruments take a fixed set of
//! legal values. Every setter quantizes the caller's request against the set
//! for that register before formatting the command, so the value written is
//! always one the hardware will actually apply.

use std::ops::RangeInclusive;

/// Return the candidate closest to `requested`.
///
/// When two candidates are equidistant, the one appearing earlier in
/// `candidates` wins; callers relying on a particular tie outcome should
/// order their set accordingly.
///
/// # Panics
///
/// Panics if `candidates` is empty. An empty set is a caller bug, not a
/// runtime condition.
pub fn quantize(requested: f64, candidates: &[f64]) -> f64 {
    assert!(!candidates.is_empty(), "candidate set must not be empty");
    let mut best = candidates[0];
    let mut best_distance = (candidates[0] - requested).abs();
    for &candidate in &candidates[1..] {
        let distance = (candidate - requested).abs();
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}

/// Build the ascending 1-2-5 decade series over the given exponent range.
///
/// This is the shape of most scale registers: `decade_steps(-9..=0)` yields
/// `1e-9, 2e-9, 5e-9, …, 1.0, 2.0, 5.0`. Callers filter or scale the result
/// for register-specific limits (minimum timebase, probe ratio, and so on).
pub fn decade_steps(exponents: RangeInclusive<i32>) -> Vec<f64> {
    let mut steps = Vec::new();
    for exp in exponents {
        for base in [1.0, 2.0, 5.0] {
            steps.push(base * pow10(exp));
        }
    }
    steps
}

// Negative powers go through one correctly-rounded division so that e.g.
// pow10(-6) equals the literal 1e-6; powi(-6) can be off by an ulp, which
// would leak into formatted SCPI commands.
fn pow10(exp: i32) -> f64 {
    if exp >= 0 {
        10f64.powi(exp)
    } else {
        1.0 / 10f64.powi(-exp)
    }
}
