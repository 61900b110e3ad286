//! Inclusion and namespace-range proof builders.
//!
//! - [`InclusionProof`]: proof for a single leaf at index `i`.
//! - [`RangeProof`]: compact multi-proof for a contiguous span of leaves
//!   `[start, start+count)`, typically "all leaves of namespace X".
//!
//! Proofs are built from a finalized tree's layers. When a layer has an odd
//! node count the duplicated sibling is emitted explicitly, so verification
//! is independent of the duplication policy. Range proofs store the minimal
//! sibling cut: at each level a pair whose both halves are in the active set
//! consumes no emitted sibling.

use serde::{Deserialize, Serialize};

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::{NamespaceId, NamespaceRange};
use crate::nmt::tree::NmtBuilder;
use crate::utils::hash::Digest32;

/// Which side of the running hash a sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Sibling is the left child; the running hash is the right child.
    L,
    /// Sibling is the right child; the running hash is the left child.
    R,
}

/// One step along a Merkle path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingStep {
    /// 0 = leaf layer, increasing towards the root.
    pub level: u32,
    pub side: Side,
    #[serde(with = "serde_bytes")]
    pub hash: Digest32,
    pub ns_min: NamespaceId,
    pub ns_max: NamespaceId,
}

impl SiblingStep {
    pub(crate) fn ns_range(&self) -> DaResult<NamespaceRange> {
        NamespaceRange::new(self.ns_min, self.ns_max)
    }
}

/// Membership proof for a single leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf_ns: NamespaceId,
    pub siblings: Vec<SiblingStep>,
}

/// Multi-proof for a contiguous span of leaves `[start, start+count)`.
///
/// The verifier is given the leaf payload hashes for the span in order (or
/// the encoded leaves to hash) plus this proof to reconstruct the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    pub start: usize,
    pub count: usize,
    /// Union namespace range of the covered leaves.
    pub ns_min: NamespaceId,
    pub ns_max: NamespaceId,
    pub siblings: Vec<SiblingStep>,
}

/* ------------------------------- Inclusion --------------------------------- */

/// Build an inclusion proof for the leaf at `index`. The tree must be
/// finalized.
pub fn build_inclusion(tree: &NmtBuilder, index: usize) -> DaResult<InclusionProof> {
    let layers = tree.layers()?;
    let n_leaves = layers[0].len();
    if index >= n_leaves {
        return Err(DaError::Validation(format!(
            "leaf index {index} out of range [0, {n_leaves})"
        )));
    }

    let mut siblings = Vec::with_capacity(layers.len());
    let mut cur = index;

    for (level, layer) in layers[..layers.len() - 1].iter().enumerate() {
        let (sib_idx, side) = if cur % 2 == 0 { (cur + 1, Side::R) } else { (cur - 1, Side::L) };
        // Odd tail: the missing right sibling is the node itself, duplicated.
        let sib = layer.get(sib_idx).unwrap_or(&layer[cur]);
        siblings.push(SiblingStep {
            level: level as u32,
            side,
            hash: sib.hash,
            ns_min: sib.ns_min(),
            ns_max: sib.ns_max(),
        });
        cur /= 2;
    }

    Ok(InclusionProof {
        leaf_index: index,
        leaf_ns: layers[0][index].ns_min(),
        siblings,
    })
}

/* --------------------------------- Range ----------------------------------- */

/// Build a compact multi-proof for the span `[start, start+count)`.
pub fn build_range(tree: &NmtBuilder, start: usize, count: usize) -> DaResult<RangeProof> {
    if count == 0 {
        return Err(DaError::Validation("range count must be > 0".into()));
    }
    let layers = tree.layers()?;
    let n_leaves = layers[0].len();
    let end = start
        .checked_add(count)
        .ok_or_else(|| DaError::Validation("range end overflows".into()))?;
    if end > n_leaves {
        return Err(DaError::Validation(format!(
            "span [{start}, {end}) out of range [0, {n_leaves})"
        )));
    }

    let ns_min = layers[0][start].ns_min();
    let ns_max = layers[0][end - 1].ns_max();

    // Active set of indices belonging to the span, merged level by level.
    let mut active: Vec<usize> = (start..end).collect();
    let mut siblings = Vec::new();

    for (level, layer) in layers[..layers.len() - 1].iter().enumerate() {
        let mut next_active = Vec::with_capacity((active.len() + 1) / 2);
        let mut i = 0;
        while i < active.len() {
            let idx = active[i];
            let (sib_idx, side) = if idx % 2 == 0 { (idx + 1, Side::R) } else { (idx - 1, Side::L) };

            // When the sibling is the next active index the pair is consumed
            // with no emitted step. Active indices are sorted, so a paired
            // right sibling is always adjacent.
            let paired = i + 1 < active.len() && active[i + 1] == sib_idx;
            if paired {
                i += 2;
            } else {
                let sib = layer.get(sib_idx).unwrap_or(&layer[idx]);
                siblings.push(SiblingStep {
                    level: level as u32,
                    side,
                    hash: sib.hash,
                    ns_min: sib.ns_min(),
                    ns_max: sib.ns_max(),
                });
                i += 1;
            }
            next_active.push(idx / 2);
        }
        active = next_active;
    }

    Ok(RangeProof {
        start,
        count,
        ns_min,
        ns_max,
        siblings,
    })
}

/* --------------------------- Namespace span lookup -------------------------- */

/// Locate the contiguous span of leaves with namespace `ns`. Returns
/// `(start, count)`. The tree must hold its leaves in non-decreasing
/// namespace order for the result to be a complete namespace query.
pub fn find_namespace_span(tree: &NmtBuilder, ns: NamespaceId) -> DaResult<(usize, usize)> {
    let layers = tree.layers()?;
    let leaves = &layers[0];
    let mut start = None;
    let mut end = 0usize;
    for (i, leaf) in leaves.iter().enumerate() {
        if leaf.ns_min() == ns {
            if start.is_none() {
                start = Some(i);
            }
            end = i + 1;
        } else if start.is_some() && leaf.ns_min() > ns {
            break;
        }
    }
    match start {
        Some(s) => Ok((s, end - s)),
        None => Err(DaError::NotFound(format!("namespace {ns} not present in leaves"))),
    }
}

/// Build a [`RangeProof`] covering all leaves of namespace `ns`.
pub fn build_namespace_range(tree: &NmtBuilder, ns: NamespaceId) -> DaResult<RangeProof> {
    let (start, count) = find_namespace_span(tree, ns)?;
    build_range(tree, start, count)
}

/* --------------------------------- Tests ----------------------------------- */
