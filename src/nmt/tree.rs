//! Incremental NMT builder with an append → finalize workflow.
//!
//! The builder records leaves in append order; it never reorders. Range
//! proofs over the finished tree are only sound when the caller appended in
//! non-decreasing namespace order (enforced by the verifiers, and optionally
//! at commit time by [`crate::nmt::commit`]).
//!
//! On [`NmtBuilder::finalize`] all inner layers are computed bottom-up. A
//! layer with an odd node count duplicates its last node (Bitcoin-style),
//! which keeps proofs short and the duplication policy explicit in emitted
//! sibling steps. Appending after finalize fails; finalizing an empty tree
//! fails; the block-level empty convention lives in
//! [`crate::adapters::core_chain`], not here.

use crate::error::{DaError, DaResult};
use crate::nmt::codec;
use crate::nmt::namespace::{NamespaceId, NamespaceRange};
use crate::nmt::node::{make_leaf, make_parent, Node};
use crate::utils::hash::{payload_hash, Digest32};

/// Simple tree statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeStats {
    pub leaves: usize,
    /// Number of layers including the leaf layer (>= 1).
    pub height: usize,
    pub ns_range: NamespaceRange,
}

/// Append-only NMT builder.
///
/// ```
/// use animica_da::nmt::{NamespaceId, NmtBuilder};
///
/// let mut t = NmtBuilder::new();
/// t.append_data(NamespaceId::new(24), b"hello").unwrap();
/// let root = t.finalize().unwrap();
/// assert_eq!(root.len(), 32);
/// ```
#[derive(Debug, Default)]
pub struct NmtBuilder {
    leaves: Vec<Node>,
    layers: Option<Vec<Vec<Node>>>,
}

impl NmtBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /* ------------------------------- Appends ------------------------------- */

    /// Append a leaf given its namespace and the 32-byte *payload hash*
    /// (`SHA3-256(uvarint(len) || data)`). Returns the leaf index.
    pub fn append_hashed(&mut self, ns: NamespaceId, payload_hash32: &Digest32) -> DaResult<usize> {
        self.ensure_not_finalized()?;
        self.leaves.push(make_leaf(ns, payload_hash32));
        Ok(self.leaves.len() - 1)
    }

    /// Append a leaf from raw payload bytes; the payload hash is computed
    /// over the canonical serialization `uvarint(len) || data`.
    pub fn append_data(&mut self, ns: NamespaceId, payload: &[u8]) -> DaResult<usize> {
        let ph = payload_hash(payload);
        self.append_hashed(ns, &ph)
    }

    /// Append an already-encoded leaf (`ns_be || uvarint(len) || data`).
    pub fn append_encoded(&mut self, encoded_leaf: &[u8]) -> DaResult<usize> {
        self.ensure_not_finalized()?;
        let (ns, _payload) = codec::decode_leaf(encoded_leaf)?;
        let ph = codec::payload_hash_from_encoded(encoded_leaf)?;
        self.append_hashed(ns, &ph)
    }

    /* -------------------------- Finalize / queries ------------------------- */

    /// Compute all inner layers and freeze the tree. Returns the 32-byte root.
    ///
    /// Idempotent: calling again returns the same root.
    pub fn finalize(&mut self) -> DaResult<Digest32> {
        if let Some(layers) = &self.layers {
            return Ok(layers.last().expect("finalized tree has layers")[0].hash);
        }
        if self.leaves.is_empty() {
            return Err(DaError::State("cannot finalize an empty tree".into()));
        }

        let mut layers: Vec<Vec<Node>> = Vec::new();
        let mut cur = self.leaves.clone();
        layers.push(cur.clone());
        while cur.len() > 1 {
            let mut next = Vec::with_capacity((cur.len() + 1) / 2);
            let mut i = 0;
            while i < cur.len() {
                let left = &cur[i];
                // Odd tail duplicates the last node.
                let right = cur.get(i + 1).unwrap_or(left);
                next.push(make_parent(left, right));
                i += 2;
            }
            layers.push(next.clone());
            cur = next;
        }

        let root = layers.last().expect("at least one layer")[0].hash;
        self.layers = Some(layers);
        Ok(root)
    }

    /// The root, finalizing first if needed.
    pub fn root(&mut self) -> DaResult<Digest32> {
        self.finalize()
    }

    /// Computed layers from leaves up to the root. Requires [`finalize`].
    pub fn layers(&self) -> DaResult<&[Vec<Node>]> {
        self.layers
            .as_deref()
            .ok_or_else(|| DaError::State("tree not finalized; call finalize() first".into()))
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.layers.is_some()
    }

    /// Namespace of the leaf at `index` (leaves carry a degenerate range).
    pub fn leaf_ns(&self, index: usize) -> DaResult<NamespaceId> {
        self.leaves
            .get(index)
            .map(|n| n.ns_min())
            .ok_or_else(|| DaError::Validation(format!("leaf index {index} out of range")))
    }

    /// Leaf count, height and covered namespace range.
    pub fn stats(&self) -> DaResult<TreeStats> {
        let first = self
            .leaves
            .first()
            .ok_or_else(|| DaError::State("empty tree has no stats".into()))?;
        let mut rng = first.ns_range;
        for leaf in &self.leaves[1..] {
            rng = rng.union(&leaf.ns_range);
        }
        let height = match &self.layers {
            Some(layers) => layers.len(),
            None => {
                let mut h = 1usize;
                let mut n = self.leaves.len();
                while n > 1 {
                    n = (n + 1) / 2;
                    h += 1;
                }
                h
            }
        };
        Ok(TreeStats {
            leaves: self.leaves.len(),
            height,
            ns_range: rng,
        })
    }

    fn ensure_not_finalized(&self) -> DaResult<()> {
        if self.layers.is_some() {
            return Err(DaError::State("tree already finalized; cannot append".into()));
        }
        Ok(())
    }
}

/* --------------------------------- Tests ----------------------------------- */
