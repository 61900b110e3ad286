//! Wire shapes for the retrieval endpoints.
//!
//! JSON uses lowercase `0x`-hex for every digest. These types are the
//! stable contract between the service, its transports, the async client
//! and light verifiers; the proof scheme identifier is bumped on any
//! layout change.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::nmt::proofs::{InclusionProof, Side, SiblingStep};
use crate::utils::bytes::{bytes_to_hex, hex_to_root};

/// Proof scheme identifier carried in every proof response.
pub const PROOF_SCHEME: &str = "nmt-sha3-v1";

/// Response of `POST /da/blob`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostBlobResponse {
    /// NMT root commitment (0x-hex).
    pub commitment: String,
    pub namespace: u32,
    pub size: u64,
    /// Optional receipt (sig / alg-policy binding) when the node signs posts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<JsonValue>,
}

/// One sibling step of an inclusion branch on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingWire {
    pub level: u32,
    /// "L" when the sibling is left of the running hash, "R" otherwise.
    pub side: String,
    pub ns_min: u32,
    pub ns_max: u32,
    /// Sibling hash, 0x-hex.
    pub hash: String,
}

impl From<&SiblingStep> for SiblingWire {
    fn from(step: &SiblingStep) -> Self {
        Self {
            level: step.level,
            side: match step.side {
                Side::L => "L".into(),
                Side::R => "R".into(),
            },
            ns_min: step.ns_min.value(),
            ns_max: step.ns_max.value(),
            hash: bytes_to_hex(&step.hash),
        }
    }
}

impl SiblingWire {
    pub fn to_step(&self) -> DaResult<SiblingStep> {
        let side = match self.side.as_str() {
            "L" => Side::L,
            "R" => Side::R,
            other => {
                return Err(DaError::Validation(format!("bad sibling side {other:?}")));
            }
        };
        Ok(SiblingStep {
            level: self.level,
            side,
            hash: hex_to_root(&self.hash)?,
            ns_min: NamespaceId::new(self.ns_min),
            ns_max: NamespaceId::new(self.ns_max),
        })
    }
}

/// Per-index proof entry of `GET /da/proof`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofQuery {
    pub index: usize,
    /// NMT leaf hash at the index, 0x-hex.
    pub leaf_hash: String,
    /// Sibling chain, bottom-up.
    pub siblings: Vec<SiblingWire>,
}

impl ProofQuery {
    /// Rebuild a verifiable [`InclusionProof`]; the blob-level namespace is
    /// supplied by the enclosing response.
    pub fn to_inclusion_proof(&self, namespace: NamespaceId) -> DaResult<InclusionProof> {
        Ok(InclusionProof {
            leaf_index: self.index,
            leaf_ns: namespace,
            siblings: self
                .siblings
                .iter()
                .map(|s| s.to_step())
                .collect::<DaResult<_>>()?,
        })
    }
}

/// Response of `GET /da/proof`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofResponse {
    pub scheme: String,
    pub namespace: u32,
    pub share_bytes: u32,
    /// Blob commitment the branches verify against, 0x-hex.
    pub commitment: String,
    pub total_leaves: usize,
    pub queries: Vec<ProofQuery>,
}

/// Stable error payload for transports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&DaError> for ErrorPayload {
    fn from(e: &DaError) -> Self {
        Self {
            code: e.code().to_string(),
            detail: Some(e.to_string()),
        }
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_wire_roundtrip() {
        let step = SiblingStep {
            level: 3,
            side: Side::L,
            hash: [0x5a; 32],
            ns_min: NamespaceId::new(1),
            ns_max: NamespaceId::new(9),
        };
        let wire = SiblingWire::from(&step);
        assert_eq!(wire.side, "L");
        assert!(wire.hash.starts_with("0x"));
        assert_eq!(wire.to_step().unwrap(), step);

        let mut bad = wire.clone();
        bad.side = "X".into();
        assert!(bad.to_step().is_err());
        let mut short = wire;
        short.hash = "0xabcd".into();
        assert!(short.to_step().is_err());
    }

    #[test]
    fn error_payload_carries_stable_code() {
        let e = DaError::NotFound("blob 0xdead".into());
        let p = ErrorPayload::from(&e);
        assert_eq!(p.code, "not_found");
        assert!(p.detail.unwrap().contains("0xdead"));
    }

    #[test]
    fn post_response_json_shape() {
        let r = PostBlobResponse {
            commitment: "0xabcd".into(),
            namespace: 24,
            size: 10,
            receipt: None,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"commitment\":\"0xabcd\""));
        assert!(!json.contains("receipt"));
    }
}
