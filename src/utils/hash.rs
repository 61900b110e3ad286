//! Hashing helpers: SHA3 wrappers and domain-separated preimages.
//!
//! Animica relies on explicit, unambiguous domain separation. For generic
//! purposes use [`hash_domain`], which prefixes the preimage with a fixed
//! ASCII prologue and the caller-supplied tag, and length-prefixes each part
//! to avoid ambiguity. The NMT has its own single-byte tags:
//!
//! ```text
//! leaf_hash  = SHA3-256( 0x00 || ns_be || SHA3-256(uvarint(len) || data) )
//! inner_hash = SHA3-256( 0x01 || left_hash || right_hash || ns_min_be || ns_max_be )
//! ```
//!
//! The leaf/inner constructors for those live in [`crate::nmt::node`]; this
//! module only provides the raw digests and the payload-hash rule.

use sha3::{Digest, Sha3_256, Sha3_512};

use crate::utils::bytes::write_uvarint;

/// 32-byte digest alias used across the crate.
pub type Digest32 = [u8; 32];

/// Domain tag for NMT leaf preimages.
pub const TAG_NMT_LEAF: u8 = 0x00;
/// Domain tag for NMT inner-node preimages.
pub const TAG_NMT_INNER: u8 = 0x01;

const ANIMICA_DS_PREFIX: &[u8] = b"Animica|DS|";

/// SHA3-256 of `data`.
pub fn sha3_256(data: &[u8]) -> Digest32 {
    let mut h = Sha3_256::new();
    h.update(data);
    h.finalize().into()
}

/// SHA3-256 over a sequence of parts without intermediate concatenation.
pub fn sha3_256_many<'a, I>(parts: I) -> Digest32
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut h = Sha3_256::new();
    for p in parts {
        h.update(p);
    }
    h.finalize().into()
}

/// SHA3-512 of `data`.
pub fn sha3_512(data: &[u8]) -> [u8; 64] {
    let mut h = Sha3_512::new();
    h.update(data);
    h.finalize().into()
}

/// Domain-separated SHA3-256 with robust framing.
///
/// Preimage layout:
/// ```text
/// b"Animica|DS|" || tag || b"|" || 0x00 || { uvarint(len(part)) || part }*
/// ```
pub fn hash_domain<'a, I>(tag: &str, parts: I) -> Digest32
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut h = Sha3_256::new();
    h.update(ANIMICA_DS_PREFIX);
    h.update(tag.as_bytes());
    h.update(b"|\x00");
    for p in parts {
        h.update(write_uvarint(p.len() as u64));
        h.update(p);
    }
    h.finalize().into()
}

/// Hash of a serialized leaf payload: `SHA3-256(uvarint(len) || data)`.
///
/// The namespace is intentionally *not* part of this digest; it is bound in
/// the leaf hash by [`crate::nmt::node::leaf_hash`].
pub fn payload_hash(data: &[u8]) -> Digest32 {
    let mut h = Sha3_256::new();
    h.update(write_uvarint(data.len() as u64));
    h.update(data);
    h.finalize().into()
}

/* --------------------------------- Tests ----------------------------------- */
