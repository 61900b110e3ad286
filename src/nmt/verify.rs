//! Fail-closed proof verification (inclusion and range).
//!
//! Verification reconstructs the Merkle path bottom-up with the same leaf and
//! parent hashing used by the builder, and additionally enforces the NMT
//! ordering invariant at every combine step: the left subtree's namespace max
//! must not exceed the right subtree's namespace min. A proof that would
//! violate the ordering is rejected regardless of its hashes.
//!
//! All `verify_*` functions return `bool` and never panic on malformed
//! input: any structural mismatch, length error or hash mismatch yields
//! `false` without partial acceptance. Root comparison is constant-time.

use subtle::ConstantTimeEq;

use crate::error::{DaError, DaResult};
use crate::nmt::codec;
use crate::nmt::namespace::NamespaceId;
use crate::nmt::node::{make_leaf, make_parent, Node};
use crate::nmt::proofs::{InclusionProof, RangeProof, Side, SiblingStep};
use crate::utils::hash::Digest32;

/// Hard bound on tree height accepted from untrusted proofs.
const MAX_LEVELS: usize = 64;

#[inline]
fn ct_eq(a: &Digest32, b: &Digest32) -> bool {
    a[..].ct_eq(&b[..]).into()
}

fn node_from_step(step: &SiblingStep) -> DaResult<Node> {
    Ok(Node {
        hash: step.hash,
        ns_range: step.ns_range()?,
    })
}

/// Combine children enforcing the namespace ordering invariant.
fn checked_parent(left: &Node, right: &Node) -> DaResult<Node> {
    if left.ns_max() > right.ns_min() {
        return Err(DaError::InvalidProof(format!(
            "namespace ordering violated: left.max {} > right.min {}",
            left.ns_max(),
            right.ns_min()
        )));
    }
    Ok(make_parent(left, right))
}

/* ------------------------------- Inclusion --------------------------------- */

fn reconstruct_inclusion_root(
    proof: &InclusionProof,
    leaf_ns: NamespaceId,
    payload_hash32: &Digest32,
) -> DaResult<Digest32> {
    if proof.siblings.len() > MAX_LEVELS {
        return Err(DaError::InvalidProof("proof path too long".into()));
    }
    let mut cur = make_leaf(leaf_ns, payload_hash32);
    let mut last_level = 0u32;
    for (i, step) in proof.siblings.iter().enumerate() {
        if i > 0 && step.level < last_level {
            return Err(DaError::InvalidProof(
                "sibling steps out of order (level decreased)".into(),
            ));
        }
        last_level = step.level;
        let sib = node_from_step(step)?;
        cur = match step.side {
            Side::R => checked_parent(&cur, &sib)?,
            Side::L => checked_parent(&sib, &cur)?,
        };
    }
    Ok(cur.hash)
}

/// Verify a single-leaf inclusion proof against `root`.
///
/// The caller supplies the leaf's `(namespace, payload_hash)`; the namespace
/// must agree with the one declared in the proof.
pub fn verify_inclusion(
    root: &[u8],
    proof: &InclusionProof,
    leaf_ns: NamespaceId,
    payload_hash32: &Digest32,
) -> bool {
    let Ok(root32) = <&Digest32>::try_from(root) else {
        return false;
    };
    if leaf_ns != proof.leaf_ns {
        return false;
    }
    match reconstruct_inclusion_root(proof, leaf_ns, payload_hash32) {
        Ok(candidate) => ct_eq(&candidate, root32),
        Err(_) => false,
    }
}

/// Verify inclusion from a fully encoded leaf (`ns_be || uvarint(len) || data`).
pub fn verify_inclusion_from_encoded(root: &[u8], proof: &InclusionProof, encoded_leaf: &[u8]) -> bool {
    let Ok((ns, _payload)) = codec::decode_leaf(encoded_leaf) else {
        return false;
    };
    let Ok(ph) = codec::payload_hash_from_encoded(encoded_leaf) else {
        return false;
    };
    verify_inclusion(root, proof, ns, &ph)
}

/* --------------------------------- Range ----------------------------------- */

fn ns_per_leaf(
    proof: &RangeProof,
    leaf_namespaces: Option<&[NamespaceId]>,
) -> DaResult<Vec<NamespaceId>> {
    match leaf_namespaces {
        Some(list) => {
            if list.len() != proof.count {
                return Err(DaError::InvalidProof(
                    "leaf_namespaces length must equal proof.count".into(),
                ));
            }
            Ok(list.to_vec())
        }
        None => {
            // Without explicit namespaces the proof must declare a degenerate
            // range (the usual single-namespace query).
            if proof.ns_min != proof.ns_max {
                return Err(DaError::InvalidProof(
                    "per-leaf namespaces required for mixed-namespace ranges".into(),
                ));
            }
            Ok(vec![proof.ns_min; proof.count])
        }
    }
}

fn reconstruct_range_root(
    proof: &RangeProof,
    payload_hashes: &[Digest32],
    leaf_namespaces: Option<&[NamespaceId]>,
) -> DaResult<Digest32> {
    if proof.count == 0 || payload_hashes.len() != proof.count {
        return Err(DaError::InvalidProof(
            "proof.count does not match number of provided leaf hashes".into(),
        ));
    }
    let namespaces = ns_per_leaf(proof, leaf_namespaces)?;

    // Active (index → node) map for the covered span at the leaf layer.
    let mut active: Vec<(usize, Node)> = payload_hashes
        .iter()
        .zip(namespaces.iter())
        .enumerate()
        .map(|(k, (ph, ns))| (proof.start + k, make_leaf(*ns, ph)))
        .collect();

    let mut steps = proof.siblings.iter();
    let mut level = 0u32;

    loop {
        if active.len() == 1 && steps.len() == 0 {
            return Ok(active[0].1.hash);
        }
        if level as usize >= MAX_LEVELS {
            return Err(DaError::InvalidProof("proof exceeds maximum tree height".into()));
        }

        let mut next_active: Vec<(usize, Node)> = Vec::with_capacity((active.len() + 1) / 2);
        let mut i = 0;
        while i < active.len() {
            let (idx, node) = active[i];
            let (sib_idx, side) = if idx % 2 == 0 { (idx + 1, Side::R) } else { (idx - 1, Side::L) };

            // Adjacent active sibling → combine without consuming a step.
            let paired = i + 1 < active.len() && active[i + 1].0 == sib_idx;
            let parent = if paired {
                let (_, right) = active[i + 1];
                i += 2;
                checked_parent(&node, &right)?
            } else {
                let step = steps
                    .next()
                    .ok_or_else(|| DaError::InvalidProof("ran out of sibling steps".into()))?;
                if step.side != side {
                    return Err(DaError::InvalidProof(format!(
                        "sibling side mismatch at level {level}"
                    )));
                }
                if step.level != level {
                    return Err(DaError::InvalidProof(format!(
                        "sibling level mismatch: expected {level}, got {}",
                        step.level
                    )));
                }
                let sib = node_from_step(step)?;
                i += 1;
                match side {
                    Side::R => checked_parent(&node, &sib)?,
                    Side::L => checked_parent(&sib, &node)?,
                }
            };
            next_active.push((idx / 2, parent));
        }
        active = next_active;
        level += 1;
    }
}

/// Verify a contiguous-span range proof.
///
/// For spans mixing namespaces, `leaf_namespaces` MUST be supplied (one per
/// leaf). Single-namespace spans may omit it when the proof declares a
/// degenerate range.
pub fn verify_range(
    root: &[u8],
    proof: &RangeProof,
    payload_hashes: &[Digest32],
    leaf_namespaces: Option<&[NamespaceId]>,
) -> bool {
    let Ok(root32) = <&Digest32>::try_from(root) else {
        return false;
    };
    match reconstruct_range_root(proof, payload_hashes, leaf_namespaces) {
        Ok(candidate) => ct_eq(&candidate, root32),
        Err(_) => false,
    }
}

/// Convenience wrapper for spans known to share one namespace.
pub fn verify_namespace_range(
    root: &[u8],
    proof: &RangeProof,
    payload_hashes: &[Digest32],
    namespace: Option<NamespaceId>,
) -> bool {
    match namespace {
        Some(ns) => {
            let namespaces = vec![ns; proof.count];
            verify_range(root, proof, payload_hashes, Some(&namespaces))
        }
        None => verify_range(root, proof, payload_hashes, None),
    }
}

/* ------------------------- Encoded-leaf wrappers ---------------------------- */

fn decode_all(encoded_leaves: &[Vec<u8>]) -> DaResult<(Vec<NamespaceId>, Vec<Digest32>)> {
    let mut ns_list = Vec::with_capacity(encoded_leaves.len());
    let mut ph_list = Vec::with_capacity(encoded_leaves.len());
    for enc in encoded_leaves {
        let (ns, _payload) = codec::decode_leaf(enc)?;
        ns_list.push(ns);
        ph_list.push(codec::payload_hash_from_encoded(enc)?);
    }
    Ok((ns_list, ph_list))
}

/// Verify a range proof from the exact encoded leaves of the covered span.
pub fn verify_range_from_encoded(root: &[u8], proof: &RangeProof, encoded_leaves: &[Vec<u8>]) -> bool {
    match decode_all(encoded_leaves) {
        Ok((ns_list, ph_list)) => verify_range(root, proof, &ph_list, Some(&ns_list)),
        Err(_) => false,
    }
}

/// Verify a single-namespace range proof from encoded leaves; all leaves must
/// carry the same namespace tag.
pub fn verify_namespace_range_from_encoded(
    root: &[u8],
    proof: &RangeProof,
    encoded_leaves: &[Vec<u8>],
) -> bool {
    match decode_all(encoded_leaves) {
        Ok((ns_list, ph_list)) => {
            if ns_list.windows(2).any(|w| w[0] != w[1]) {
                return false;
            }
            verify_range(root, proof, &ph_list, Some(&ns_list))
        }
        Err(_) => false,
    }
}

/* --------------------------------- Tests ----------------------------------- */
