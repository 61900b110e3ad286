//! Decoder: recover a blob from erasure-coded namespaced leaves.
//!
//! Given RS(k, n) with shard size B, the encoder emits per stripe k data
//! leaves (the last one possibly short) followed by p = n−k parity leaves of
//! exactly B bytes. Recovery needs any ≥ k leaf bodies per stripe at known
//! positions.
//!
//! The decoder is pure: it does not verify inclusion proofs. Callers that
//! hold a DA root verify each leaf first (see [`crate::nmt::verify`] and the
//! light client) and feed only authenticated leaves here.
//!
//! Size recovery: the caller-supplied `original_size` wins; otherwise a short
//! (non-empty) data leaf observed in the last stripe pins the boundary;
//! otherwise the result is flagged `size_ambiguous` and returned fully
//! padded.

use std::collections::BTreeMap;

use crate::erasure::params::ErasureParams;
use crate::erasure::reed_solomon::rs_decode;
use crate::error::{DaError, DaResult};
use crate::nmt::codec::decode_leaf;
use crate::nmt::namespace::NamespaceId;

/// One leaf (data or parity) belonging to a stripe of size n = k + p.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafRecord {
    /// 0-based stripe index in the blob layout.
    pub stripe: usize,
    /// Position within the stripe: `0..k` data rows, `k..n` parity rows.
    pub position: usize,
    /// Encoded NMT leaf bytes (`ns_be || uvarint(len) || data`).
    pub leaf: Vec<u8>,
}

/// Outcome of a decode attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeResult {
    pub blob: Vec<u8>,
    pub recovered_stripes: usize,
    pub stripes_total: usize,
    pub used_records: usize,
    pub missing_stripes: Vec<usize>,
    pub size_ambiguous: bool,
    pub inferred_size: Option<usize>,
}

/// Options for [`decode_blob_from_records`].
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Enforce this namespace tag on every leaf.
    pub expected_namespace: Option<NamespaceId>,
    /// Exact blob length known out-of-band (e.g. from the commitment).
    pub original_size: Option<usize>,
    /// Expected stripe count, for diagnostics only.
    pub stripes_hint: Option<usize>,
    /// Fail when any stripe up to the highest observed one lacks k leaves.
    /// Defaults to true via [`DecodeOptions::strict`].
    pub require_all_stripes: bool,
}

impl DecodeOptions {
    /// Default strict options: all stripes required.
    pub fn strict() -> Self {
        Self {
            require_all_stripes: true,
            ..Self::default()
        }
    }

    pub fn with_original_size(mut self, size: usize) -> Self {
        self.original_size = Some(size);
        self
    }

    pub fn with_namespace(mut self, ns: NamespaceId) -> Self {
        self.expected_namespace = Some(ns);
        self
    }
}

/// Recover a blob from a set of erasure-coded leaves spanning its stripes.
pub fn decode_blob_from_records(
    records: &[LeafRecord],
    params: &ErasureParams,
    opts: &DecodeOptions,
) -> DaResult<DecodeResult> {
    let k = params.data_shards;
    let n = params.total_shards;
    let b = params.share_bytes;

    if records.is_empty() {
        let known_empty = opts.original_size == Some(0);
        return Ok(DecodeResult {
            blob: Vec::new(),
            recovered_stripes: 0,
            stripes_total: opts.stripes_hint.unwrap_or(0),
            used_records: 0,
            missing_stripes: Vec::new(),
            size_ambiguous: !known_empty,
            inferred_size: known_empty.then_some(0),
        });
    }

    // Group records by stripe, normalizing every body to B bytes.
    let mut by_stripe: BTreeMap<usize, BTreeMap<usize, Vec<u8>>> = BTreeMap::new();
    for rec in records {
        if rec.position >= n {
            return Err(DaError::Validation(format!(
                "position out of range (0..{n}): {}",
                rec.position
            )));
        }
        let (ns, body) = decode_leaf(&rec.leaf)?;
        if let Some(expected) = opts.expected_namespace {
            if ns != expected {
                return Err(DaError::InvalidProof(format!(
                    "namespace tag mismatch for leaf: {ns} != {expected}"
                )));
            }
        }
        if body.len() > b {
            return Err(DaError::Validation("leaf body exceeds share_bytes".into()));
        }
        let mut payload = body.to_vec();
        payload.resize(b, 0);

        let stripe_map = by_stripe.entry(rec.stripe).or_default();
        if stripe_map.insert(rec.position, payload).is_some() {
            return Err(DaError::Validation(format!(
                "duplicate leaf for stripe {}, position {}",
                rec.stripe, rec.position
            )));
        }
    }

    let max_stripe = *by_stripe.keys().next_back().expect("records non-empty");
    let stripes_total = opts.stripes_hint.unwrap_or(max_stripe + 1);

    // Per-stripe RS decode where possible.
    let mut recovered: BTreeMap<usize, Vec<Vec<u8>>> = BTreeMap::new();
    let mut missing = Vec::new();
    for s in 0..=max_stripe {
        match by_stripe.get(&s) {
            Some(shard_map) if shard_map.len() >= k => {
                let data = rs_decode(shard_map, params)
                    .map_err(|e| DaError::Decode(format!("stripe {s}: {e}")))?;
                recovered.insert(s, data);
            }
            _ => missing.push(s),
        }
    }

    if opts.require_all_stripes && !missing.is_empty() {
        return Err(DaError::Decode(format!(
            "insufficient shards to recover stripes {missing:?}; need at least {k} of {n} leaves per stripe"
        )));
    }

    if recovered.is_empty() {
        return Ok(DecodeResult {
            blob: Vec::new(),
            recovered_stripes: 0,
            stripes_total,
            used_records: records.len(),
            missing_stripes: missing,
            size_ambiguous: opts.original_size.is_none(),
            inferred_size: opts.original_size,
        });
    }

    // Reassemble in stripe order.
    let last_stripe = *recovered.keys().next_back().expect("non-empty");
    let mut blob_full = Vec::with_capacity((last_stripe + 1) * k * b);
    for data in recovered.values() {
        for shard in data {
            blob_full.extend_from_slice(shard);
        }
    }

    // Decide the trim length. Inference from a short data leaf is only
    // meaningful when no stripe below the last one is missing.
    let (total_len, size_ambiguous, inferred_size) = match opts.original_size {
        Some(size) => (size, false, Some(size)),
        None if missing.is_empty() => match infer_size_from_last_stripe(records, last_stripe, k, b)
        {
            Some(size) => (size, false, Some(size)),
            None => (blob_full.len(), true, None),
        },
        None => (blob_full.len(), true, None),
    };

    if total_len > blob_full.len() {
        return Err(DaError::Decode(
            "computed blob length exceeds reconstructed bytes".into(),
        ));
    }
    blob_full.truncate(total_len);

    Ok(DecodeResult {
        blob: blob_full,
        recovered_stripes: recovered.len(),
        stripes_total,
        used_records: records.len(),
        missing_stripes: missing,
        size_ambiguous,
        inferred_size,
    })
}

/// Infer the exact blob length from a short, non-empty data leaf in the last
/// stripe. A full leaf tells nothing (the blob may end exactly on a shard
/// boundary) and an empty leaf only bounds the size, so neither is used.
fn infer_size_from_last_stripe(
    records: &[LeafRecord],
    last_stripe: usize,
    k: usize,
    b: usize,
) -> Option<usize> {
    for rec in records {
        if rec.stripe != last_stripe || rec.position >= k {
            continue;
        }
        if let Ok((_, body)) = decode_leaf(&rec.leaf) {
            if !body.is_empty() && body.len() < b {
                return Some((last_stripe * k + rec.position) * b + body.len());
            }
        }
    }
    None
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erasure::encoder::encode_blob_to_leaves;

    fn ns(v: u32) -> NamespaceId {
        NamespaceId::new(v)
    }

    fn params(k: usize, n: usize, b: usize) -> ErasureParams {
        ErasureParams::new(k, n, b).unwrap()
    }

    fn records_from(leaves: &[Vec<u8>], n: usize, keep: impl Fn(usize) -> bool) -> Vec<LeafRecord> {
        leaves
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(i, leaf)| LeafRecord {
                stripe: i / n,
                position: i % n,
                leaf: leaf.clone(),
            })
            .collect()
    }

    #[test]
    fn roundtrip_with_known_size() {
        let p = params(2, 4, 4);
        let (leaves, _) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &p).unwrap();

        // Drop two of four leaves per stripe: keep positions 1 and 3.
        let records = records_from(&leaves, 4, |i| i % 4 == 1 || i % 4 == 3);
        let opts = DecodeOptions::strict()
            .with_original_size(10)
            .with_namespace(ns(5));
        let res = decode_blob_from_records(&records, &p, &opts).unwrap();
        assert_eq!(res.blob, b"HELLOWORLD");
        assert_eq!(res.recovered_stripes, 2);
        assert!(!res.size_ambiguous);
        assert!(res.missing_stripes.is_empty());
    }

    #[test]
    fn size_inferred_from_short_data_leaf() {
        let p = params(2, 4, 4);
        let (leaves, _) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &p).unwrap();

        // Keep everything: the short "LD" data leaf in the last stripe pins
        // the exact length without an out-of-band size.
        let records = records_from(&leaves, 4, |_| true);
        let res = decode_blob_from_records(&records, &p, &DecodeOptions::strict()).unwrap();
        assert_eq!(res.blob, b"HELLOWORLD");
        assert_eq!(res.inferred_size, Some(10));
        assert!(!res.size_ambiguous);
    }

    #[test]
    fn parity_only_without_size_is_ambiguous() {
        let p = params(2, 4, 4);
        let (leaves, _) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &p).unwrap();

        // Parity positions only (2, 3): recoverable, but no data leaf tells
        // where the payload ends.
        let records = records_from(&leaves, 4, |i| i % 4 >= 2);
        let res = decode_blob_from_records(&records, &p, &DecodeOptions::strict()).unwrap();
        assert!(res.size_ambiguous);
        assert_eq!(res.blob.len(), 16); // fully padded
        assert_eq!(&res.blob[..10], b"HELLOWORLD");
    }

    #[test]
    fn missing_stripe_detected() {
        let p = params(2, 4, 4);
        let (leaves, _) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &p).unwrap();

        // Only one leaf of stripe 0, below k.
        let records = records_from(&leaves, 4, |i| i == 0 || i >= 4);
        let err = decode_blob_from_records(&records, &p, &DecodeOptions::strict()).unwrap_err();
        assert!(matches!(err, DaError::Decode(_)));

        // Non-strict mode reports the gap instead.
        let lax = DecodeOptions {
            require_all_stripes: false,
            ..DecodeOptions::default()
        };
        let res = decode_blob_from_records(&records, &p, &lax).unwrap();
        assert_eq!(res.missing_stripes, vec![0]);
    }

    #[test]
    fn duplicate_and_foreign_leaves_rejected() {
        let p = params(2, 4, 4);
        let (leaves, _) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &p).unwrap();

        let mut records = records_from(&leaves, 4, |i| i < 4);
        records.push(records[0].clone());
        assert!(decode_blob_from_records(&records, &p, &DecodeOptions::strict()).is_err());

        let records = records_from(&leaves, 4, |i| i < 4);
        let opts = DecodeOptions::strict().with_namespace(ns(6));
        assert!(matches!(
            decode_blob_from_records(&records, &p, &opts),
            Err(DaError::InvalidProof(_))
        ));
    }

    #[test]
    fn empty_records() {
        let p = params(2, 4, 4);
        let res =
            decode_blob_from_records(&[], &p, &DecodeOptions::strict().with_original_size(0))
                .unwrap();
        assert!(res.blob.is_empty());
        assert!(!res.size_ambiguous);

        let res2 = decode_blob_from_records(&[], &p, &DecodeOptions::strict()).unwrap();
        assert!(res2.size_ambiguous);
    }
}
