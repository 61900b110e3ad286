//! Encoder pipeline: raw blob → (data shards → RS parity) → namespaced leaves.
//!
//! Canonical ordering, per stripe:
//!
//! ```text
//! [ data_0, ..., data_{k-1}, parity_0, ..., parity_{p-1} ]
//! ```
//!
//! Data leaves embed only the meaningful portion of their shard (no right
//! padding); parity leaves always embed the full `share_bytes` payload. This
//! ordering is consensus-critical: the NMT root over these leaves is the blob
//! commitment.

use crate::erasure::params::ErasureParams;
use crate::erasure::partitioner::partition_blob;
use crate::erasure::reed_solomon::rs_encode;
use crate::error::{DaError, DaResult};
use crate::nmt::codec::encode_leaf;
use crate::nmt::namespace::NamespaceId;

/// Describes how a blob was encoded into leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeInfo {
    pub params: ErasureParams,
    pub namespace: NamespaceId,
    /// Input blob length in bytes.
    pub original_size: usize,
    pub stripes: usize,
    /// Meaningful byte count per data shard (short only in the last stripe).
    pub data_lengths: Vec<usize>,
}

impl EncodeInfo {
    #[inline]
    pub fn leaves_per_stripe(&self) -> usize {
        self.params.total_shards
    }

    #[inline]
    pub fn total_leaves(&self) -> usize {
        self.stripes * self.params.total_shards
    }

    #[inline]
    pub fn total_data_shards(&self) -> usize {
        self.stripes * self.params.data_shards
    }

    /// Convert `(stripe, position)` to a global leaf index, `position ∈ [0, n)`.
    pub fn leaf_index(&self, stripe: usize, position: usize) -> DaResult<usize> {
        if stripe >= self.stripes {
            return Err(DaError::Validation(format!("stripe {stripe} out of range")));
        }
        let n = self.params.total_shards;
        if position >= n {
            return Err(DaError::Validation(format!("position {position} out of range")));
        }
        Ok(stripe * n + position)
    }
}

/// Encode `blob` into namespaced NMT leaves under `namespace`.
///
/// Returns the leaves in canonical per-stripe order plus an [`EncodeInfo`]
/// describing the geometry. An empty blob yields zero leaves.
pub fn encode_blob_to_leaves(
    blob: &[u8],
    namespace: NamespaceId,
    params: &ErasureParams,
) -> DaResult<(Vec<Vec<u8>>, EncodeInfo)> {
    let k = params.data_shards;
    let data_shards = partition_blob(blob, params);
    let stripes = data_shards.len() / k.max(1);
    let data_lengths: Vec<usize> = data_shards.iter().map(|s| s.data_len).collect();

    let mut leaves = Vec::with_capacity(stripes * params.total_shards);
    for stripe in data_shards.chunks(k) {
        // Data leaves carry the meaningful bytes only.
        for shard in stripe {
            leaves.push(encode_leaf(namespace, shard.body()));
        }
        // Parity is computed over the padded payloads and always full-size.
        let payloads: Vec<Vec<u8>> = stripe.iter().map(|s| s.payload.clone()).collect();
        for parity in rs_encode(&payloads, params)? {
            debug_assert_eq!(parity.len(), params.share_bytes);
            leaves.push(encode_leaf(namespace, &parity));
        }
    }

    let info = EncodeInfo {
        params: *params,
        namespace,
        original_size: blob.len(),
        stripes,
        data_lengths,
    };
    debug_assert_eq!(leaves.len(), info.total_leaves());
    Ok((leaves, info))
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmt::codec::decode_leaf;

    fn ns(v: u32) -> NamespaceId {
        NamespaceId::new(v)
    }

    fn params(k: usize, n: usize, b: usize) -> ErasureParams {
        ErasureParams::new(k, n, b).unwrap()
    }

    #[test]
    fn empty_blob_yields_no_leaves() {
        let (leaves, info) = encode_blob_to_leaves(b"", ns(5), &params(2, 4, 4)).unwrap();
        assert!(leaves.is_empty());
        assert_eq!(info.stripes, 0);
        assert_eq!(info.total_leaves(), 0);
    }

    #[test]
    fn helloworld_leaf_geometry() {
        let (leaves, info) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &params(2, 4, 4)).unwrap();
        assert_eq!(info.stripes, 2);
        assert_eq!(leaves.len(), 8);

        // Stripe 0: two full data leaves, two parity leaves of 4 bytes.
        let (n0, d0) = decode_leaf(&leaves[0]).unwrap();
        assert_eq!((n0.value(), d0), (5, b"HELL".as_ref()));
        let (_, d1) = decode_leaf(&leaves[1]).unwrap();
        assert_eq!(d1, b"OWOR");
        let (_, p0) = decode_leaf(&leaves[2]).unwrap();
        assert_eq!(p0.len(), 4);

        // Stripe 1: short data leaf carries only "LD"; padding shard encodes
        // an empty body; parity stays full width.
        let (_, d2) = decode_leaf(&leaves[4]).unwrap();
        assert_eq!(d2, b"LD");
        let (_, d3) = decode_leaf(&leaves[5]).unwrap();
        assert!(d3.is_empty());
        let (_, p2) = decode_leaf(&leaves[6]).unwrap();
        assert_eq!(p2.len(), 4);

        assert_eq!(info.data_lengths, vec![4, 4, 2, 0]);
        assert_eq!(info.leaf_index(1, 2).unwrap(), 6);
        assert!(info.leaf_index(2, 0).is_err());
        assert!(info.leaf_index(0, 4).is_err());
    }

    #[test]
    fn deterministic_output() {
        let p = params(2, 4, 8);
        let a = encode_blob_to_leaves(b"determinism matters", ns(24), &p).unwrap();
        let b = encode_blob_to_leaves(b"determinism matters", ns(24), &p).unwrap();
        assert_eq!(a.0, b.0);
    }
}
