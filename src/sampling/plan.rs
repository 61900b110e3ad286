//! Sample index selection over the leaf matrix.
//!
//! Indices are drawn without replacement (every index at most once), which
//! matches the hypergeometric side of the availability math and never wastes
//! a fetch. Passing a seed makes the draw reproducible; light clients log
//! the seed so disputed samples can be replayed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::erasure::layout::MatrixLayout;
use crate::error::{DaError, DaResult};

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Draw `count` distinct indices uniformly from `[0, total)`.
///
/// `count` is clamped to `total`; asking for anything from an empty
/// population is an error.
pub fn draw_uniform(total: usize, count: usize, seed: Option<u64>) -> DaResult<Vec<usize>> {
    if total == 0 {
        return if count == 0 {
            Ok(Vec::new())
        } else {
            Err(DaError::Validation("cannot sample an empty population".into()))
        };
    }
    let count = count.min(total);
    let mut rng = rng_for(seed);

    // Partial Fisher–Yates over the index space.
    let mut pool: Vec<usize> = (0..total).collect();
    for i in 0..count {
        let j = rng.gen_range(i..total);
        pool.swap(i, j);
    }
    pool.truncate(count);
    Ok(pool)
}

/// Draw ~`count` indices stratified across rows: every stripe receives an
/// equal share of the budget (remainder spread over the first rows), columns
/// chosen uniformly within each row.
///
/// Stratification guarantees row coverage once `count >= rows`, which the
/// uniform draw only achieves in expectation.
pub fn draw_stratified(
    layout: &MatrixLayout,
    count: usize,
    seed: Option<u64>,
) -> DaResult<Vec<usize>> {
    let total = layout.total_leaves();
    if total == 0 {
        return if count == 0 {
            Ok(Vec::new())
        } else {
            Err(DaError::Validation("cannot sample an empty matrix".into()))
        };
    }
    let count = count.min(total);
    let mut rng = rng_for(seed);

    let base = count / layout.rows;
    let extra = count % layout.rows;
    let mut out = Vec::with_capacity(count);
    for row in 0..layout.rows {
        let want = (base + usize::from(row < extra)).min(layout.cols);
        // Partial Fisher–Yates over the row's columns.
        let mut cols: Vec<usize> = (0..layout.cols).collect();
        for i in 0..want {
            let j = rng.gen_range(i..layout.cols);
            cols.swap(i, j);
        }
        for &c in &cols[..want] {
            out.push(layout.index(row, c)?);
        }
    }
    Ok(out)
}

/* --------------------------------- Tests ----------------------------------- */
