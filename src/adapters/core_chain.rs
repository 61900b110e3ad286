//! Block-level DA root computation and validation.
//!
//! Two canonical modes:
//!
//! 1. **Leaves** (preferred): concatenate all namespaced leaves of every
//!    included blob, in exact block order, and compute a single NMT root over
//!    the full leaf stream. Required for share-level sampling.
//! 2. **Commitments** (fallback): one namespaced leaf per inclusion with the
//!    blob's 32-byte commitment as its body. Binds which blobs a block
//!    references without exposing share indices, which is fine for dev networks
//!    without sampling.
//!
//! `Auto` picks leaves iff every inclusion carries leaves.
//!
//! Block authors MUST pass inclusions in the exact order they serialize in
//! the block body; nothing here sorts. Empty block: the DA root is
//! `SHA3-256(b"")` by convention (the NMT builder itself refuses empty
//! trees).

use subtle::ConstantTimeEq;

use crate::error::{DaError, DaResult};
use crate::nmt::codec::encode_leaf;
use crate::nmt::commit::root_from_encoded_leaves;
use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::{sha3_256, Digest32};

/// How the DA root is derived from the block's inclusions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DaRootMode {
    /// Leaves iff every inclusion has them, commitments otherwise.
    #[default]
    Auto,
    Leaves,
    Commitments,
}

/// One blob included in a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobInclusion {
    pub namespace: NamespaceId,
    /// Per-blob commitment (NMT root over that blob's own leaves).
    pub commitment: Digest32,
    /// Original blob size in bytes, metadata only.
    pub size: u64,
    /// Encoded leaves (`ns_be || uvarint(len) || data`) when available.
    pub leaves: Option<Vec<Vec<u8>>>,
}

impl BlobInclusion {
    pub fn without_leaves(namespace: NamespaceId, commitment: Digest32, size: u64) -> Self {
        Self {
            namespace,
            commitment,
            size,
            leaves: None,
        }
    }

    pub fn with_leaves(
        namespace: NamespaceId,
        commitment: Digest32,
        size: u64,
        leaves: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            namespace,
            commitment,
            size,
            leaves: Some(leaves),
        }
    }
}

/// Convenience: build inclusions from `(namespace, commitment, size)` tuples.
pub fn inclusions_from_commitments<I>(entries: I) -> Vec<BlobInclusion>
where
    I: IntoIterator<Item = (NamespaceId, Digest32, u64)>,
{
    entries
        .into_iter()
        .map(|(ns, c, size)| BlobInclusion::without_leaves(ns, c, size))
        .collect()
}

/// Convenience: build inclusions from `(namespace, commitment, size, leaves)`
/// tuples; the leaves must already be in canonical encoded form.
pub fn inclusions_from_leaves<I>(entries: I) -> Vec<BlobInclusion>
where
    I: IntoIterator<Item = (NamespaceId, Digest32, u64, Vec<Vec<u8>>)>,
{
    entries
        .into_iter()
        .map(|(ns, c, size, leaves)| BlobInclusion::with_leaves(ns, c, size, leaves))
        .collect()
}

/// Compute the DA root for a sequence of inclusions in block order.
pub fn compute_da_root(inclusions: &[BlobInclusion], mode: DaRootMode) -> DaResult<Digest32> {
    let mode = match mode {
        DaRootMode::Auto => {
            if inclusions.iter().all(|i| i.leaves.is_some()) {
                DaRootMode::Leaves
            } else {
                DaRootMode::Commitments
            }
        }
        m => m,
    };

    if inclusions.is_empty() {
        return Ok(sha3_256(b""));
    }

    match mode {
        DaRootMode::Leaves => {
            let mut flat: Vec<&[u8]> = Vec::new();
            for inc in inclusions {
                let leaves = inc.leaves.as_ref().ok_or_else(|| {
                    DaError::Validation("leaves mode requires leaves for all inclusions".into())
                })?;
                flat.extend(leaves.iter().map(|l| l.as_slice()));
            }
            if flat.is_empty() {
                return Ok(sha3_256(b""));
            }
            // Block-wide streams concatenate per-blob leaf runs, whose
            // namespaces need not be globally sorted; order stays verbatim.
            root_from_encoded_leaves(flat, false)
        }
        DaRootMode::Commitments => {
            let encoded: Vec<Vec<u8>> = inclusions
                .iter()
                .map(|inc| encode_leaf(inc.namespace, &inc.commitment))
                .collect();
            root_from_encoded_leaves(encoded.iter().map(|l| l.as_slice()), false)
        }
        DaRootMode::Auto => unreachable!("auto resolved above"),
    }
}

/// Recompute the DA root from inclusions and compare against the header
/// value in constant time. Mismatch raises a diagnostic.
pub fn validate_da_root(
    header_da_root: &Digest32,
    inclusions: &[BlobInclusion],
    mode: DaRootMode,
) -> DaResult<()> {
    let expected = compute_da_root(inclusions, mode)?;
    if bool::from(expected[..].ct_eq(&header_da_root[..])) {
        Ok(())
    } else {
        Err(DaError::InvalidProof(format!(
            "DA root mismatch: header={} expected={}",
            bytes_to_hex(header_da_root),
            bytes_to_hex(&expected)
        )))
    }
}

/* --------------------------------- Tests ----------------------------------- */
