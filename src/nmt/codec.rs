//! Canonical on-wire leaf encoding for the NMT.
//!
//! Format (per leaf):
//! ```text
//! leaf := ns_be || uvarint(len) || data
//! ```
//! `ns_be` is the namespace id as fixed-width big-endian (4 bytes at the
//! current width); `uvarint` is unsigned LEB128. Leaves carry only the
//! meaningful payload, never right-padding.
//!
//! The *payload hash* used by NMT leaf hashing is
//! `SHA3-256(uvarint(len) || data)`; the namespace is not part of it, and
//! namespace is bound separately in [`crate::nmt::node::leaf_hash`].

use crate::constants::NS_BYTES;
use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::{read_uvarint, write_uvarint};
use crate::utils::hash::{sha3_256, Digest32};

/// Serialize one leaf as `ns_be || uvarint(len) || data`.
pub fn encode_leaf(ns: NamespaceId, data: &[u8]) -> Vec<u8> {
    let len_prefix = write_uvarint(data.len() as u64);
    let mut out = Vec::with_capacity(NS_BYTES + len_prefix.len() + data.len());
    out.extend_from_slice(&ns.to_be_bytes());
    out.extend_from_slice(&len_prefix);
    out.extend_from_slice(data);
    out
}

/// Parse a single leaf from `buf` starting at `offset`.
///
/// Returns `(ns, payload, new_offset)`. Fails on truncated buffers and on
/// declared lengths exceeding the remaining bytes.
pub fn decode_one(buf: &[u8], offset: usize) -> DaResult<(NamespaceId, &[u8], usize)> {
    if offset > buf.len() {
        return Err(DaError::Validation("offset out of range".into()));
    }
    if buf.len() - offset < NS_BYTES + 1 {
        return Err(DaError::Validation(
            "buffer too small for namespace and length".into(),
        ));
    }
    let ns = NamespaceId::from_be_slice(&buf[offset..offset + NS_BYTES])?;
    let (length, after_len) = read_uvarint(buf, offset + NS_BYTES)?;
    let length = usize::try_from(length)
        .map_err(|_| DaError::Validation("declared leaf length exceeds addressable size".into()))?;
    let end = after_len
        .checked_add(length)
        .ok_or_else(|| DaError::Validation("declared leaf length overflows".into()))?;
    if end > buf.len() {
        return Err(DaError::Validation("declared length exceeds buffer".into()));
    }
    Ok((ns, &buf[after_len..end], end))
}

/// Strict decoder for a buffer that must contain exactly one leaf.
pub fn decode_leaf(encoded: &[u8]) -> DaResult<(NamespaceId, &[u8])> {
    let (ns, payload, end) = decode_one(encoded, 0)?;
    if end != encoded.len() {
        return Err(DaError::Validation(
            "extra trailing bytes after a single leaf".into(),
        ));
    }
    Ok((ns, payload))
}

/// Iterate all leaves in a concatenated buffer.
pub fn iter_leaves(buf: &[u8]) -> LeafIter<'_> {
    LeafIter { buf, offset: 0 }
}

/// Iterator over concatenated encoded leaves; yields a typed error on the
/// first malformed entry and then stops.
pub struct LeafIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for LeafIter<'a> {
    type Item = DaResult<(NamespaceId, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.buf.len() {
            return None;
        }
        match decode_one(self.buf, self.offset) {
            Ok((ns, payload, next)) => {
                self.offset = next;
                Some(Ok((ns, payload)))
            }
            Err(e) => {
                self.offset = self.buf.len();
                Some(Err(e))
            }
        }
    }
}

/// Compute `SHA3-256(uvarint(len) || data)` directly from an encoded leaf.
///
/// The payload serialization starts immediately after the fixed-width
/// namespace field, so this is a single hash over `encoded[NS_BYTES..]`.
pub fn payload_hash_from_encoded(encoded_leaf: &[u8]) -> DaResult<Digest32> {
    if encoded_leaf.len() < NS_BYTES + 1 {
        return Err(DaError::Validation("encoded leaf too short".into()));
    }
    // Validate the length varint actually matches the tail before hashing.
    let (length, after_len) = read_uvarint(encoded_leaf, NS_BYTES)?;
    if after_len as u64 + length != encoded_leaf.len() as u64 {
        return Err(DaError::Validation(
            "encoded leaf length varint disagrees with buffer".into(),
        ));
    }
    Ok(sha3_256(&encoded_leaf[NS_BYTES..]))
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::payload_hash;

    #[test]
    fn leaf_roundtrip_hello() {
        // ns=7, data="hello" → 00000007 05 68656c6c6f
        let enc = encode_leaf(NamespaceId::new(7), b"hello");
        assert_eq!(enc, hex::decode("000000070568656c6c6f").unwrap());
        let (ns, payload) = decode_leaf(&enc).unwrap();
        assert_eq!(ns.value(), 7);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let enc = encode_leaf(NamespaceId::new(1), b"");
        assert_eq!(enc.len(), NS_BYTES + 1);
        let (ns, payload) = decode_leaf(&enc).unwrap();
        assert_eq!(ns.value(), 1);
        assert!(payload.is_empty());
    }

    #[test]
    fn truncation_and_overrun_rejected() {
        let enc = encode_leaf(NamespaceId::new(9), b"abcdef");
        // Truncated namespace field
        assert!(decode_one(&enc[..3], 0).is_err());
        // Declared length exceeds buffer
        assert!(decode_one(&enc[..enc.len() - 1], 0).is_err());
        // Trailing garbage after a single leaf
        let mut extra = enc.clone();
        extra.push(0xaa);
        assert!(decode_leaf(&extra).is_err());
    }

    #[test]
    fn iterates_concatenated_leaves() {
        let mut buf = encode_leaf(NamespaceId::new(1), b"a");
        buf.extend_from_slice(&encode_leaf(NamespaceId::new(1), b"bb"));
        buf.extend_from_slice(&encode_leaf(NamespaceId::new(2), b"ccc"));

        let leaves: Vec<_> = iter_leaves(&buf).collect::<DaResult<_>>().unwrap();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0], (NamespaceId::new(1), b"a".as_ref()));
        assert_eq!(leaves[2], (NamespaceId::new(2), b"ccc".as_ref()));
    }

    #[test]
    fn payload_hash_matches_direct_rule() {
        let enc = encode_leaf(NamespaceId::new(24), b"payload");
        assert_eq!(
            payload_hash_from_encoded(&enc).unwrap(),
            payload_hash(b"payload")
        );
    }

    #[test]
    fn encode_is_injective_on_boundaries() {
        // ("ab","") vs ("a","b") style confusion is impossible thanks to the
        // explicit length varint.
        let a = encode_leaf(NamespaceId::new(5), b"ab");
        let b = encode_leaf(NamespaceId::new(5), b"a");
        assert_ne!(a, b);
        assert_ne!(
            payload_hash_from_encoded(&a).unwrap(),
            payload_hash_from_encoded(&b).unwrap()
        );
    }
}
