//! Retrieval service: the orchestration behind the three DA endpoints.
//!
//! - **post**: validate the body, compute the commitment, persist, and
//!   optionally issue a signed receipt.
//! - **get**: return payload bytes, honoring a single byte range and the
//!   commitment-bound ETag.
//! - **proof**: rebuild the blob's leaves deterministically from stored
//!   bytes, refuse to serve branches when the recomputed root disagrees with
//!   the indexed commitment (that is store corruption, not a proof error),
//!   and emit per-index sibling chains.
//!
//! The service is transport-free; HTTP frameworks mount these methods and
//! map [`crate::error::DaError`] to wire codes. Body-size bounds are
//! enforced before any hashing happens.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::blob::receipt::{build_receipt, BlobReceipt, SignFn};
use crate::blob::store::BlobStore;
use crate::blob::types::Commitment;
use crate::config::DaConfig;
use crate::erasure::encoder::encode_blob_to_leaves;
use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::nmt::proofs::build_inclusion;
use crate::nmt::tree::NmtBuilder;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::Digest32;

use super::handlers::{etag_for_commitment, if_none_match_hits, parse_range_header};
use super::wire::{ProofQuery, ProofResponse, SiblingWire, PROOF_SCHEME};

/// Receipt issuance configuration, injected by the node.
pub struct ReceiptSigner {
    pub chain_id: u64,
    pub policy_root: Digest32,
    pub alg_id: u32,
    pub signer_address: String,
    pub sign_fn: Box<dyn for<'a, 'b> Fn(u32, &'a str, &'b [u8]) -> DaResult<Vec<u8>> + Send + Sync>,
}

/// Outcome of a blob post.
#[derive(Clone, Debug)]
pub struct PostOutcome {
    pub commitment: Commitment,
    pub receipt: Option<BlobReceipt>,
    /// True when the root was already stored (idempotent re-post).
    pub existed: bool,
}

impl PostOutcome {
    /// Wire-shape response for transports.
    pub fn to_wire(&self) -> super::wire::PostBlobResponse {
        let receipt = self.receipt.as_ref().map(|r| {
            serde_json::json!({
                "commitment": bytes_to_hex(&r.commitment),
                "namespace": r.namespace.value(),
                "size_bytes": r.size_bytes,
                "chain_id": r.chain_id,
                "policy_root": bytes_to_hex(&r.policy_root),
                "alg_id": r.alg_id,
                "signer": r.signer,
                "signature": bytes_to_hex(&r.signature),
                "timestamp": r.timestamp,
                "mime": r.mime,
            })
        });
        super::wire::PostBlobResponse {
            commitment: self.commitment.root_hex(),
            namespace: self.commitment.namespace.value(),
            size: self.commitment.size_bytes,
            receipt,
        }
    }
}

/// A ready-to-send blob response with endpoint semantics applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobResponse {
    /// 200 full, 206 partial, 304 not modified.
    pub status: u16,
    pub body: Vec<u8>,
    pub etag: String,
    /// Set on 206 responses.
    pub content_range: Option<String>,
    pub total_len: u64,
}

/// DA retrieval orchestration over a shared blob store.
pub struct RetrievalService {
    store: Arc<BlobStore>,
    params: ErasureParams,
    max_blob_bytes: usize,
    receipt_signer: Option<ReceiptSigner>,
}

impl RetrievalService {
    pub fn new(store: Arc<BlobStore>, params: ErasureParams, max_blob_bytes: usize) -> Self {
        Self {
            store,
            params,
            max_blob_bytes,
            receipt_signer: None,
        }
    }

    pub fn from_config(store: Arc<BlobStore>, config: &DaConfig) -> DaResult<Self> {
        Ok(Self::new(
            store,
            config.erasure_params()?,
            config.max_blob_bytes,
        ))
    }

    /// Attach a receipt signer; posts will carry signed receipts.
    pub fn with_receipt_signer(mut self, signer: ReceiptSigner) -> Self {
        self.receipt_signer = Some(signer);
        self
    }

    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    /* -------------------------------- POST ----------------------------------- */

    /// Accept a raw blob under `namespace`: commit, persist, receipt.
    pub fn post_blob(&self, namespace: NamespaceId, data: &[u8]) -> DaResult<PostOutcome> {
        if data.is_empty() {
            return Err(DaError::Validation("empty body".into()));
        }
        if data.len() > self.max_blob_bytes {
            return Err(DaError::Resource(format!(
                "request body {} exceeds cap {}",
                data.len(),
                self.max_blob_bytes
            )));
        }

        let outcome = self.store.add_bytes(data, namespace, None, &self.params)?;
        let receipt = match &self.receipt_signer {
            Some(signer) => Some(self.issue_receipt(signer, &outcome.commitment)?),
            None => None,
        };
        debug!(root = %outcome.commitment.root_hex(), existed = outcome.existed, "blob posted");
        Ok(PostOutcome {
            commitment: outcome.commitment,
            receipt,
            existed: outcome.existed,
        })
    }

    fn issue_receipt(
        &self,
        signer: &ReceiptSigner,
        commitment: &Commitment,
    ) -> DaResult<BlobReceipt> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let sign_fn: &SignFn<'_> = &*signer.sign_fn;
        build_receipt(
            commitment.root,
            commitment.namespace,
            commitment.size_bytes,
            signer.chain_id,
            signer.policy_root,
            signer.alg_id,
            &signer.signer_address,
            now,
            None,
            sign_fn,
        )
    }

    /* --------------------------------- GET ------------------------------------ */

    /// Full payload bytes by commitment root.
    pub fn get_blob(&self, root: &Digest32) -> DaResult<Vec<u8>> {
        self.store.read(root)
    }

    /// Payload with range/conditional semantics applied: honors one
    /// `Range: bytes=…` and `If-None-Match`, emits a strong ETag.
    pub fn get_blob_range(
        &self,
        root: &Digest32,
        range_header: Option<&str>,
        if_none_match: Option<&str>,
    ) -> DaResult<BlobResponse> {
        let payload = self.store.read(root)?;
        let total_len = payload.len() as u64;
        let etag = etag_for_commitment(&bytes_to_hex(root))?;

        if if_none_match_hits(if_none_match, &etag) {
            return Ok(BlobResponse {
                status: 304,
                body: Vec::new(),
                etag,
                content_range: None,
                total_len,
            });
        }

        match parse_range_header(range_header, total_len)? {
            None => Ok(BlobResponse {
                status: 200,
                body: payload,
                etag,
                content_range: None,
                total_len,
            }),
            Some(range) => {
                let body = payload[range.start as usize..=range.end as usize].to_vec();
                Ok(BlobResponse {
                    status: 206,
                    body,
                    etag,
                    content_range: Some(range.to_content_range()),
                    total_len,
                })
            }
        }
    }

    /* -------------------------------- PROOF ----------------------------------- */

    /// Per-index inclusion branches for a stored blob.
    ///
    /// Leaves are rebuilt deterministically from the stored payload using the
    /// erasure profile recorded at post time. If the recomputed root differs
    /// from the requested commitment the payload is corrupt and no branches
    /// are served.
    pub fn get_proof(&self, root: &Digest32, indices: &[usize]) -> DaResult<ProofResponse> {
        if indices.is_empty() {
            return Err(DaError::Validation("no indices requested".into()));
        }

        let meta = self
            .store
            .get_meta(root)?
            .ok_or_else(|| DaError::NotFound(format!("blob {}", bytes_to_hex(root))))?;
        let payload = self.store.read(root)?;

        // Prefer the profile the blob was encoded with; fall back to ours.
        let params = match (meta.data_shards, meta.total_shards, meta.share_bytes) {
            (Some(k), Some(n), Some(b)) => {
                ErasureParams::new(k as usize, n as usize, b as usize)?
            }
            _ => self.params,
        };

        let (leaves, info) = encode_blob_to_leaves(&payload, meta.namespace, &params)?;
        let total_leaves = info.total_leaves();

        let mut tree = NmtBuilder::new();
        for leaf in &leaves {
            tree.append_encoded(leaf)?;
        }
        let recomputed = tree.finalize()?;
        if &recomputed != root {
            warn!(root = %bytes_to_hex(root), "stored payload does not match its commitment");
            return Err(DaError::StoreCorruption(format!(
                "stored blob does not recompute to commitment {}",
                bytes_to_hex(root)
            )));
        }

        for &i in indices {
            if i >= total_leaves {
                return Err(DaError::InvalidProof(format!(
                    "index {i} out of range [0, {total_leaves})"
                )));
            }
        }

        let layers = tree.layers()?;
        let mut queries = Vec::with_capacity(indices.len());
        for &i in indices {
            let proof = build_inclusion(&tree, i)?;
            queries.push(ProofQuery {
                index: i,
                leaf_hash: bytes_to_hex(&layers[0][i].hash),
                siblings: proof.siblings.iter().map(SiblingWire::from).collect(),
            });
        }

        Ok(ProofResponse {
            scheme: PROOF_SCHEME.to_string(),
            namespace: meta.namespace.value(),
            share_bytes: params.share_bytes as u32,
            commitment: bytes_to_hex(root),
            total_leaves,
            queries,
        })
    }
}

/// Parse a CSV of non-negative leaf indices (`"1,5,42"`).
pub fn parse_indices_csv(csv: &str) -> DaResult<Vec<usize>> {
    let mut out = Vec::new();
    for piece in csv.split(',') {
        let p = piece.trim();
        if p.is_empty() {
            continue;
        }
        let v: usize = p
            .parse()
            .map_err(|_| DaError::Validation(format!("invalid index {p:?}")))?;
        out.push(v);
    }
    if out.is_empty() {
        return Err(DaError::Validation("no indices provided".into()));
    }
    Ok(out)
}

/* --------------------------------- Tests ----------------------------------- */
