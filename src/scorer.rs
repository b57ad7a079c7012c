//! Anomaly scoring by Fisher's combined-probability test.
//!
//! # Algorithm
//!
//! For each channel and each of the two parameter stores (local, global)
//! whose include flag is set, the raw draw `z` contributes
//!
//! ```text
//! term = −2·ln p,   p = two-tailed normal tail of z
//! ```
//!
//! With `n` contributing terms the sum `X` follows χ² with `2n` degrees of
//! freedom under the null, so
//!
//! ```text
//! combined = 1 − F_χ²(X; 2n)        (1 if that is ≤ 0)
//! score    = combined · P(shape)
//! ```
//!
//! where `P(shape)` is the shape's selection probability. A small score
//! marks a jointly improbable set of draws.
//!
//! # Reference
//! Fisher, R.A. (1925). *Statistical Methods for Research Workers*, §21.1.

use tracing::trace;

use crate::channel::Channel;
use crate::object::{ChannelValues, SpawnedObjectState};
use crate::params::ParameterSet;
use crate::shape::ShapeWeights;
use crate::special::{chi_squared_cdf, p_value_two_tailed};

/// Breakdown of one object's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    /// Σ −2·ln p over contributing terms.
    pub statistic: f64,
    /// Twice the number of contributing terms.
    pub degrees_of_freedom: u32,
    pub combined_p_value: f64,
    pub shape_probability: f64,
    /// `combined_p_value × shape_probability`, in `(0, 1]`.
    pub score: f64,
}

/// Fisher contribution `−2·ln p` of one raw standard-normal draw.
///
/// The p-value is floored at `f64::MIN_POSITIVE`, so an extreme draw gives
/// a large finite term.
///
/// # Examples
/// ```
/// use anomaly_synth::scorer::fisher_term;
/// assert_eq!(fisher_term(0.0), 0.0);
/// assert!(fisher_term(40.0).is_finite());
/// ```
pub fn fisher_term(raw: f64) -> f64 {
    let p = p_value_two_tailed(raw).max(f64::MIN_POSITIVE);
    -2.0 * p.ln()
}

/// Upper-tail probability of `statistic` under χ² with `degrees_of_freedom`.
///
/// A non-positive result is replaced by 1. This includes statistics so far
/// in the tail that the CDF rounds to exactly 1.
///
/// # Examples
/// ```
/// use anomaly_synth::scorer::combined_p_value;
/// assert_eq!(combined_p_value(0.0, 4), 1.0);
/// // one p-value in, the same p-value out
/// assert!((combined_p_value(-2.0 * 0.05_f64.ln(), 2) - 0.05).abs() < 1e-5);
/// ```
pub fn combined_p_value(statistic: f64, degrees_of_freedom: u32) -> f64 {
    let p = 1.0 - chi_squared_cdf(statistic, degrees_of_freedom);
    if p <= 0.0 {
        1.0
    } else {
        p
    }
}

fn accumulate(
    store: &ParameterSet,
    values: &ChannelValues,
    statistic: &mut f64,
    count: &mut u32,
) {
    for channel in Channel::ALL {
        if !store.is_included(channel) {
            continue;
        }
        let raw = values.raw(channel);
        let term = fisher_term(raw);
        trace!(target: "scorer", label = %store.label(), %channel, raw, term);
        *statistic += term;
        *count += 1;
    }
}

/// Scores `state` against the stores it was sampled from.
///
/// Include flags are read from each store independently: a channel
/// included in both contributes two terms.
pub fn evaluate(
    state: &SpawnedObjectState,
    local: &ParameterSet,
    global: &ParameterSet,
    weights: &ShapeWeights,
) -> AnomalyScore {
    let mut statistic = 0.0;
    let mut count = 0;
    accumulate(local, &state.local, &mut statistic, &mut count);
    accumulate(global, &state.global, &mut statistic, &mut count);

    let degrees_of_freedom = 2 * count;
    let combined_p_value = combined_p_value(statistic, degrees_of_freedom);
    let shape_probability = weights.selection_probability(state.shape);
    AnomalyScore {
        statistic,
        degrees_of_freedom,
        combined_p_value,
        shape_probability,
        score: combined_p_value * shape_probability,
    }
}

/// Final anomaly score of `state`. Shorthand for `evaluate(..).score`.
pub fn score(
    state: &SpawnedObjectState,
    local: &ParameterSet,
    global: &ParameterSet,
    weights: &ShapeWeights,
) -> f64 {
    evaluate(state, local, global, weights).score
}

/// Whether a score falls below the anomaly threshold.
///
/// # Examples
/// ```
/// use anomaly_synth::scorer::is_anomalous;
/// assert!(is_anomalous(0.004, 0.01));
/// assert!(!is_anomalous(0.01, 0.01));
/// ```
pub fn is_anomalous(score: f64, p_threshold: f64) -> bool {
    score < p_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::sampler::{resample, SamplingContext};
    use crate::shape::{ParamLabel, Shape};

    fn stores(shape: Shape) -> (ParameterSet, ParameterSet) {
        (
            ParameterSet::with_defaults(ParamLabel::Shape(shape)),
            ParameterSet::with_defaults(ParamLabel::Global),
        )
    }

    fn state_with_raw(shape: Shape, local_raw: f64, global_raw: f64) -> SpawnedObjectState {
        let (local, global) = stores(shape);
        let mut state = resample(shape, &local, &global, &mut create_rng(0), &SamplingContext::default());
        state.local.raw = [local_raw; 16];
        state.global.raw = [global_raw; 16];
        state
    }

    fn exclude_all(set: &mut ParameterSet) {
        for ch in Channel::ALL {
            set.set_included(ch, false);
        }
    }

    #[test]
    fn test_fisher_term_values() {
        assert_eq!(fisher_term(0.0), 0.0);
        let p = p_value_two_tailed(1.5);
        assert_eq!(fisher_term(1.5), -2.0 * p.ln());
        assert_eq!(fisher_term(-1.5), fisher_term(1.5));
    }

    #[test]
    fn test_fisher_term_extreme_is_finite() {
        let t = fisher_term(1e6);
        assert!(t.is_finite());
        assert!(t > 1000.0);
    }

    #[test]
    fn test_combined_zero_statistic() {
        assert_eq!(combined_p_value(0.0, 2), 1.0);
        assert_eq!(combined_p_value(0.0, 0), 1.0);
    }

    #[test]
    fn test_combined_degenerate_floors_to_one() {
        assert_eq!(combined_p_value(f64::INFINITY, 4), 1.0);
    }

    #[test]
    fn test_combined_single_term_identity() {
        for p in [0.5, 0.1, 0.01] {
            let stat = -2.0 * f64::ln(p);
            let combined = combined_p_value(stat, 2);
            assert!((combined - p).abs() < 1e-5, "p={p} got {combined}");
        }
    }

    #[test]
    fn test_null_draws_score_one() {
        let state = state_with_raw(Shape::Cube, 0.0, 0.0);
        let (local, global) = stores(Shape::Cube);
        let result = evaluate(&state, &local, &global, &ShapeWeights::zero());
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.degrees_of_freedom, 64);
        assert_eq!(result.combined_p_value, 1.0);
        assert_eq!(result.shape_probability, 1.0);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_include_flags_per_store() {
        let state = state_with_raw(Shape::Cube, 1.0, 1.0);
        let (mut local, mut global) = stores(Shape::Cube);
        exclude_all(&mut local);
        exclude_all(&mut global);
        local.set_included(Channel::XRotation, true);
        global.set_included(Channel::XRotation, true);
        global.set_included(Channel::SurfaceNoise, true);

        let result = evaluate(&state, &local, &global, &ShapeWeights::zero());
        assert_eq!(result.degrees_of_freedom, 6);
        assert_eq!(result.statistic, 3.0 * fisher_term(1.0));
    }

    #[test]
    fn test_nothing_included() {
        let state = state_with_raw(Shape::Cube, 5.0, 5.0);
        let (mut local, mut global) = stores(Shape::Cube);
        exclude_all(&mut local);
        exclude_all(&mut global);
        let result = evaluate(&state, &local, &global, &ShapeWeights::zero());
        assert_eq!(result.degrees_of_freedom, 0);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_extreme_draws_are_anomalous() {
        // sixteen two-sigma draws out of 32 terms: combined p ≈ 0.0034
        let state = state_with_raw(Shape::Cube, 2.0, 0.0);
        let (local, global) = stores(Shape::Cube);
        let s = score(&state, &local, &global, &ShapeWeights::zero());
        assert!(s > 0.001 && s < 0.01, "score {s}");
        assert!(is_anomalous(s, 0.01));
    }

    #[test]
    fn test_shape_probability_scales_score() {
        let state = state_with_raw(Shape::Cone, 0.0, 0.0);
        let (local, global) = stores(Shape::Cone);
        let mut weights = ShapeWeights::zero();
        weights.set(Shape::Cone, 1.0);
        weights.set(Shape::Cube, 3.0);
        let result = evaluate(&state, &local, &global, &weights);
        assert_eq!(result.shape_probability, 0.25);
        assert_eq!(result.score, 0.25);
    }

    #[test]
    fn test_is_anomalous_strict() {
        assert!(is_anomalous(0.009, 0.01));
        assert!(!is_anomalous(0.01, 0.01));
        assert!(!is_anomalous(1.0, 0.01));
    }
}
