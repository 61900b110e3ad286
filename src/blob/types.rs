//! Core blob types shared by the store, commitment helpers, retrieval API and
//! adapters.
//!
//! All byte identifiers are carried as raw bytes internally; hex conversion
//! (`0x…`, lowercase) happens only at API boundaries.

use serde::{Deserialize, Serialize};

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::Digest32;

/// Canonical commitment to a blob: the NMT root over its erasure-coded,
/// namespaced leaves, plus the original payload size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub namespace: NamespaceId,
    #[serde(with = "serde_bytes")]
    pub root: Digest32,
    pub size_bytes: u64,
}

impl Commitment {
    pub fn new(namespace: NamespaceId, root: Digest32, size_bytes: u64) -> Self {
        Self {
            namespace,
            root,
            size_bytes,
        }
    }

    /// Lowercase `0x`-hex of the root; also the store's content address.
    pub fn root_hex(&self) -> String {
        bytes_to_hex(&self.root)
    }
}

/// Descriptive metadata stored and indexed alongside a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMeta {
    pub namespace: NamespaceId,
    pub size_bytes: u64,
    /// Optional MIME hint, informational only.
    pub mime: Option<String>,
    /// Erasure profile used during encoding, when known.
    pub data_shards: Option<u32>,
    pub total_shards: Option<u32>,
    pub share_bytes: Option<u32>,
}

impl BlobMeta {
    pub fn validate(&self) -> DaResult<()> {
        match (self.data_shards, self.total_shards) {
            (Some(k), _) if k == 0 => {
                return Err(DaError::Validation("data_shards must be > 0".into()))
            }
            (_, Some(n)) if n == 0 => {
                return Err(DaError::Validation("total_shards must be > 0".into()))
            }
            (Some(k), Some(n)) if k > n => {
                return Err(DaError::Validation(
                    "data_shards cannot exceed total_shards".into(),
                ))
            }
            _ => {}
        }
        if self.share_bytes == Some(0) {
            return Err(DaError::Validation("share_bytes must be > 0".into()));
        }
        if let Some(m) = &self.mime {
            if m.len() > 255 || !m.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
                return Err(DaError::Validation("invalid mime hint".into()));
            }
        }
        Ok(())
    }
}

/// A stored blob reference: everything needed to locate and serve a payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    #[serde(with = "serde_bytes")]
    pub root: Digest32,
    pub namespace: NamespaceId,
    pub size_bytes: u64,
    /// Content address: lowercase `0x`-hex of the root.
    pub storage_key: String,
    /// Absolute path of the payload file.
    pub path: String,
    /// Unix seconds of the index insertion.
    pub created_at: i64,
    pub mime: Option<String>,
}

impl BlobRef {
    pub fn root_hex(&self) -> String {
        bytes_to_hex(&self.root)
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_hex_is_lowercase_prefixed() {
        let c = Commitment::new(NamespaceId::new(7), [0xab; 32], 100);
        let h = c.root_hex();
        assert!(h.starts_with("0x"));
        assert_eq!(h.len(), 66);
        assert_eq!(h, h.to_lowercase());
    }

    #[test]
    fn meta_validation() {
        let mut m = BlobMeta {
            namespace: NamespaceId::new(1),
            size_bytes: 10,
            mime: Some("application/octet-stream".into()),
            data_shards: Some(2),
            total_shards: Some(4),
            share_bytes: Some(16),
        };
        m.validate().unwrap();

        m.data_shards = Some(8);
        assert!(m.validate().is_err());
        m.data_shards = Some(2);
        m.mime = Some("bad\u{1}mime".into());
        assert!(m.validate().is_err());
    }
}
