//! Low-level helpers shared by every layer: byte/hex/varint codecs and the
//! SHA3 hashing surface with its NMT domain tags.

pub mod bytes;
pub mod hash;
