//! Availability-sampling math.
//!
//! Models an adversary that withholds leaves of the extended matrix. A
//! stripe becomes unrecoverable once fewer than k of its n leaves remain, so
//! the minimal withholding that breaks one stripe is `n − k + 1` leaves. An
//! adversary minimizing detectability concentrates exactly that much damage
//! into as few stripes as it needs to break.
//!
//! Notation: `T` total leaves, `B` withheld leaves, `f = B / T`, `s` samples.
//!
//! Miss probabilities for s uniform samples:
//! - without replacement (hypergeometric): `C(T−B, s) / C(T, s)`
//! - with replacement (binomial): `(1 − f)^s`
//!
//! Sizing: with replacement the closed form `s ≥ ⌈ln(p*) / ln(1 − f)⌉`
//! applies; without replacement it is used as a lower bound and tightened by
//! integer search. The formulas deliberately ignore proof structure so they
//! stay conservative and easy to audit.

use serde::{Deserialize, Serialize};

use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};

/// Which probability model sized a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleModel {
    Binomial,
    Hypergeometric,
}

/// Result of a sample sizing computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplePlan {
    pub samples: usize,
    pub model: SampleModel,
    pub bad_leaves: usize,
    pub total_leaves: usize,
    pub bad_fraction: f64,
    pub stripes_broken: usize,
    /// Informational note, set when there is nothing to detect.
    pub note: Option<String>,
}

/* ----------------------------- Miss probability ----------------------------- */

/// Probability that all `samples` draws WITHOUT replacement avoid the bad
/// set: `C(total−bad, samples) / C(total, samples)`.
pub fn miss_prob_hypergeom(total: usize, bad: usize, samples: usize) -> DaResult<f64> {
    if bad > total {
        return Err(DaError::Validation("bad leaves exceed total".into()));
    }
    if samples == 0 {
        return Ok(1.0);
    }
    if total == 0 {
        // Degenerate empty matrix: a miss is vacuously certain.
        return Ok(1.0);
    }
    if samples > total - bad {
        return Ok(0.0);
    }
    // Product form Π (T−B−i)/(T−i) avoids big-integer binomials.
    let mut p = 1.0f64;
    for i in 0..samples {
        p *= (total - bad - i) as f64 / (total - i) as f64;
    }
    Ok(p)
}

/// Binomial (with-replacement) miss probability `(1 − f)^s`.
pub fn miss_prob_binomial(bad_fraction: f64, samples: usize) -> DaResult<f64> {
    if !(0.0..=1.0).contains(&bad_fraction) {
        return Err(DaError::Validation("bad_fraction must be in [0, 1]".into()));
    }
    if samples == 0 || bad_fraction == 0.0 {
        return Ok(1.0);
    }
    Ok((1.0 - bad_fraction).powi(samples as i32))
}

/* -------------------------------- Sample sizing ------------------------------ */

fn check_target(target_p_fail: f64) -> DaResult<()> {
    if !(target_p_fail > 0.0 && target_p_fail < 1.0) {
        return Err(DaError::Validation("target_p_fail must be in (0, 1)".into()));
    }
    Ok(())
}

/// Minimal `s` with `(1 − f)^s ≤ target` under the binomial model.
pub fn samples_for_p_fail_binomial(bad_fraction: f64, target_p_fail: f64) -> DaResult<usize> {
    check_target(target_p_fail)?;
    if bad_fraction <= 0.0 {
        return Ok(0); // nothing to detect
    }
    if bad_fraction >= 1.0 {
        return Ok(1);
    }
    let mut s = (target_p_fail.ln() / (1.0 - bad_fraction).ln()).ceil().max(0.0) as usize;
    // Guard the f64 rounding at the boundary so the result is exactly minimal.
    while s > 0 && miss_prob_binomial(bad_fraction, s - 1)? <= target_p_fail {
        s -= 1;
    }
    while miss_prob_binomial(bad_fraction, s)? > target_p_fail {
        s += 1;
    }
    Ok(s)
}

/// Minimal `s` with hypergeometric miss probability ≤ target, found by
/// integer search upward from the binomial lower bound.
pub fn samples_for_p_fail_hypergeom(
    total: usize,
    bad: usize,
    target_p_fail: f64,
) -> DaResult<usize> {
    check_target(target_p_fail)?;
    if bad == 0 || total == 0 {
        return Ok(0);
    }
    let f = bad as f64 / total as f64;
    let mut s = samples_for_p_fail_binomial(f, target_p_fail)?;
    // Without replacement each draw helps at least as much, so the binomial
    // count is an upper bound; walk down to the minimum first.
    while s > 0 && miss_prob_hypergeom(total, bad, s - 1)? <= target_p_fail {
        s -= 1;
    }
    while miss_prob_hypergeom(total, bad, s)? > target_p_fail {
        s += 1;
    }
    Ok(s)
}

/* ------------------------------ Adversary model ------------------------------ */

/// Leaves to withhold in a single stripe to make it unrecoverable.
#[inline]
pub fn min_withheld_per_broken_stripe(params: &ErasureParams) -> usize {
    params.total_shards - params.data_shards + 1
}

/// Total withheld leaves when the adversary minimally breaks
/// `stripes_broken` stripes.
pub fn worst_case_bad_leaves(
    params: &ErasureParams,
    stripes: usize,
    stripes_broken: usize,
) -> DaResult<usize> {
    if stripes_broken == 0 {
        return Err(DaError::Validation("stripes_broken must be >= 1".into()));
    }
    if stripes == 0 {
        return Err(DaError::Validation("stripes must be >= 1".into()));
    }
    Ok(stripes_broken.min(stripes) * min_withheld_per_broken_stripe(params))
}

/// Global bad fraction under the minimal-withholding model.
pub fn bad_fraction_for_broken_stripes(
    params: &ErasureParams,
    stripes: usize,
    stripes_broken: usize,
) -> DaResult<f64> {
    let bad = worst_case_bad_leaves(params, stripes, stripes_broken)?;
    let total = stripes * params.total_shards;
    Ok(if total == 0 { 0.0 } else { bad as f64 / total as f64 })
}

/* --------------------------------- Planner ---------------------------------- */

/// Compute the number of uniform samples needed so that the probability of
/// missing every withheld leaf is ≤ `target_p_fail`, under an adversary that
/// minimally breaks `stripes_broken` stripes.
pub fn plan_samples_for_target(
    params: &ErasureParams,
    stripes: usize,
    target_p_fail: f64,
    stripes_broken: usize,
    with_replacement: bool,
) -> DaResult<SamplePlan> {
    check_target(target_p_fail)?;
    let model = if with_replacement {
        SampleModel::Binomial
    } else {
        SampleModel::Hypergeometric
    };

    let total = stripes * params.total_shards;
    if stripes == 0 || total == 0 {
        return Ok(SamplePlan {
            samples: 0,
            model,
            bad_leaves: 0,
            total_leaves: total,
            bad_fraction: 0.0,
            stripes_broken,
            note: Some("empty matrix: nothing to sample".into()),
        });
    }

    let bad = worst_case_bad_leaves(params, stripes, stripes_broken)?;
    let f = bad as f64 / total as f64;
    if bad == 0 {
        return Ok(SamplePlan {
            samples: 0,
            model,
            bad_leaves: 0,
            total_leaves: total,
            bad_fraction: 0.0,
            stripes_broken,
            note: Some("no detectable withholding under given parameters".into()),
        });
    }

    let samples = if with_replacement {
        samples_for_p_fail_binomial(f, target_p_fail)?
    } else {
        samples_for_p_fail_hypergeom(total, bad, target_p_fail)?
    };

    Ok(SamplePlan {
        samples,
        model,
        bad_leaves: bad,
        total_leaves: total,
        bad_fraction: f,
        stripes_broken,
        note: None,
    })
}

/// Probability of missing all withheld leaves with `samples` draws, the
/// inverse direction of [`plan_samples_for_target`].
pub fn p_fail_for_samples(
    params: &ErasureParams,
    stripes: usize,
    samples: usize,
    stripes_broken: usize,
    with_replacement: bool,
) -> DaResult<f64> {
    let total = stripes * params.total_shards;
    if stripes == 0 || total == 0 {
        return Ok(1.0);
    }
    let bad = worst_case_bad_leaves(params, stripes, stripes_broken)?;
    if bad == 0 {
        return Ok(1.0);
    }
    if with_replacement {
        miss_prob_binomial(bad as f64 / total as f64, samples)
    } else {
        miss_prob_hypergeom(total, bad, samples)
    }
}

/* --------------------------------- Tests ----------------------------------- */
