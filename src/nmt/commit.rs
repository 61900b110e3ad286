//! Commitment (root) computation from leaf inputs.
//!
//! Helpers to compute the DA commitment (the NMT root) from the three leaf
//! input forms the rest of the crate produces:
//!
//! - already-encoded leaves (`ns_be || uvarint(len) || data`)
//! - `(namespace, payload_bytes)` pairs
//! - `(namespace, payload_hash)` pairs (lowest level)
//!
//! Each helper enforces non-decreasing namespace order by default, matching
//! the canonical NMT layout required for namespace-range proofs.

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::nmt::tree::NmtBuilder;
use crate::utils::hash::Digest32;

fn check_order(count: usize, last: Option<NamespaceId>, ns: NamespaceId) -> DaResult<()> {
    if let Some(prev) = last {
        if ns < prev {
            return Err(DaError::Validation(format!(
                "namespace order violation at leaf {count}: {ns} < {prev}"
            )));
        }
    }
    Ok(())
}

/// Compute the NMT root from already-encoded leaves.
pub fn root_from_encoded_leaves<'a, I>(encoded_leaves: I, enforce_ns_order: bool) -> DaResult<Digest32>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut nmt = NmtBuilder::new();
    let mut last: Option<NamespaceId> = None;
    let mut count = 0usize;
    for enc in encoded_leaves {
        let idx = nmt.append_encoded(enc)?;
        let ns = nmt.leaf_ns(idx)?;
        if enforce_ns_order {
            check_order(count, last, ns)?;
        }
        last = Some(ns);
        count += 1;
    }
    if count == 0 {
        return Err(DaError::State("cannot compute root for empty leaf set".into()));
    }
    nmt.finalize()
}

/// Compute the NMT root from `(namespace, payload_bytes)` pairs.
pub fn root_from_ns_and_payloads<'a, I>(pairs: I, enforce_ns_order: bool) -> DaResult<Digest32>
where
    I: IntoIterator<Item = (NamespaceId, &'a [u8])>,
{
    let mut nmt = NmtBuilder::new();
    let mut last: Option<NamespaceId> = None;
    let mut count = 0usize;
    for (ns, payload) in pairs {
        if enforce_ns_order {
            check_order(count, last, ns)?;
        }
        nmt.append_data(ns, payload)?;
        last = Some(ns);
        count += 1;
    }
    if count == 0 {
        return Err(DaError::State("cannot compute root for empty leaf set".into()));
    }
    nmt.finalize()
}

/// Compute the NMT root from `(namespace, payload_hash)` pairs.
pub fn root_from_ns_and_hashes<I>(pairs: I, enforce_ns_order: bool) -> DaResult<Digest32>
where
    I: IntoIterator<Item = (NamespaceId, Digest32)>,
{
    let mut nmt = NmtBuilder::new();
    let mut last: Option<NamespaceId> = None;
    let mut count = 0usize;
    for (ns, h) in pairs {
        if enforce_ns_order {
            check_order(count, last, ns)?;
        }
        nmt.append_hashed(ns, &h)?;
        last = Some(ns);
        count += 1;
    }
    if count == 0 {
        return Err(DaError::State("cannot compute root for empty leaf set".into()));
    }
    nmt.finalize()
}

/* --------------------------------- Tests ----------------------------------- */
