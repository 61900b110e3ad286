//! NMT node structure and the canonical hashing rules.
//!
//! Single-byte domain tags keep leaf and inner preimages unambiguous:
//!
//! ```text
//! leaf_hash  = SHA3-256( 0x00 || ns_be || payload_hash )
//! inner_hash = SHA3-256( 0x01 || left_hash || right_hash || ns_min_be || ns_max_be )
//! ```
//!
//! `payload_hash` is `SHA3-256(uvarint(len) || data)` over the serialized
//! leaf payload (see [`crate::nmt::codec`]). The namespace bounds are inside
//! the inner preimage, so a proof cannot substitute child ranges without
//! changing the digest.

use crate::nmt::namespace::{NamespaceId, NamespaceRange};
use crate::utils::hash::{sha3_256_many, Digest32, TAG_NMT_INNER, TAG_NMT_LEAF};

/// Internal NMT node: a digest plus the namespace range it covers.
///
/// Builders keep nodes in flat per-layer vectors; verifiers rebuild them from
/// proof material. No parent/child links are ever needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub hash: Digest32,
    pub ns_range: NamespaceRange,
}

impl Node {
    #[inline]
    pub fn ns_min(&self) -> NamespaceId {
        self.ns_range.min()
    }

    #[inline]
    pub fn ns_max(&self) -> NamespaceId {
        self.ns_range.max()
    }
}

/// Canonical NMT leaf hash: `SHA3-256(0x00 || ns_be || payload_hash)`.
#[inline]
pub fn leaf_hash(ns: NamespaceId, payload_hash: &Digest32) -> Digest32 {
    sha3_256_many([
        &[TAG_NMT_LEAF][..],
        &ns.to_be_bytes()[..],
        &payload_hash[..],
    ])
}

/// Canonical NMT inner-node hash:
/// `SHA3-256(0x01 || left_hash || right_hash || ns_min_be || ns_max_be)`.
#[inline]
pub fn inner_hash(
    left_hash: &Digest32,
    right_hash: &Digest32,
    ns_min: NamespaceId,
    ns_max: NamespaceId,
) -> Digest32 {
    sha3_256_many([
        &[TAG_NMT_INNER][..],
        &left_hash[..],
        &right_hash[..],
        &ns_min.to_be_bytes()[..],
        &ns_max.to_be_bytes()[..],
    ])
}

/// Construct a leaf node from a namespace id and the payload hash.
pub fn make_leaf(ns: NamespaceId, payload_hash: &Digest32) -> Node {
    Node {
        hash: leaf_hash(ns, payload_hash),
        ns_range: NamespaceRange::point(ns),
    }
}

/// Combine two children into their parent. The range is the union of the
/// children's ranges; order is significant for the digest.
pub fn make_parent(left: &Node, right: &Node) -> Node {
    let rng = left.ns_range.union(&right.ns_range);
    Node {
        hash: inner_hash(&left.hash, &right.hash, rng.min(), rng.max()),
        ns_range: rng,
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::payload_hash;

    fn ns(v: u32) -> NamespaceId {
        NamespaceId::new(v)
    }

    #[test]
    fn leaf_commits_to_namespace() {
        let ph = payload_hash(b"payload");
        assert_ne!(leaf_hash(ns(1), &ph), leaf_hash(ns(2), &ph));
    }

    #[test]
    fn parent_range_is_union_and_order_matters() {
        let a = make_leaf(ns(1), &payload_hash(b"a"));
        let b = make_leaf(ns(9), &payload_hash(b"b"));

        let p1 = make_parent(&a, &b);
        let p2 = make_parent(&b, &a);

        assert_eq!(p1.ns_min().value(), 1);
        assert_eq!(p1.ns_max().value(), 9);
        assert_eq!(p2.ns_range, p1.ns_range);
        assert_ne!(p1.hash, p2.hash, "left/right order must affect the digest");
    }

    #[test]
    fn parent_commits_to_bounds_not_only_hashes() {
        // Children with identical hashes but different ranges produce
        // different parents: the range is part of the preimage.
        let h = payload_hash(b"same");
        let p_a = inner_hash(&h, &h, ns(3), ns(7));
        let p_b = inner_hash(&h, &h, ns(3), ns(8));
        assert_ne!(p_a, p_b);
    }
}
