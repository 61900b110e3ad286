//! Signed blob acceptance receipts.
//!
//! A post receipt binds a blob commitment to the namespace, size, optional
//! MIME, the active signature-algorithm policy root, the chain id, and the
//! signer. Receipts are acceptance evidence, not part of the block DA root.
//!
//! Signatures cover canonical CBOR "SignBytes": a definite-length map with
//! integer keys in ascending order. The wire receipt appends the signature
//! under key 11. No concrete signature scheme lives here; callers inject
//! sign/verify callbacks so the post-quantum backends stay pluggable.
//!
//! SignBytes keys:
//! ```text
//! 1  domain tag "da_receipt_v1"      6  mime (or null)
//! 2  chain id                       7  alg-policy root (32B)
//! 3  commitment (bytes)             8  alg id
//! 4  namespace                      9  signer address (lowercase)
//! 5  size in bytes                 10  timestamp (unix seconds)
//! ```

use ciborium::value::Value;

use crate::constants::MAX_BLOB_BYTES;
use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::utils::hash::{sha3_256, Digest32};

/// Domain/version tag carried under key 1.
pub const RECEIPT_DOMAIN_TAG: &str = "da_receipt_v1";

/// `sign_fn(alg_id, signer_address, signbytes) -> signature`
pub type SignFn<'a> = dyn Fn(u32, &str, &[u8]) -> DaResult<Vec<u8>> + 'a;

/// `verify_fn(alg_id, signer_address, signbytes, signature) -> bool`
pub type VerifyFn<'a> = dyn Fn(u32, &str, &[u8], &[u8]) -> bool + 'a;

/// Receipt for a posted blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobReceipt {
    /// NMT root / commitment of the blob.
    pub commitment: Digest32,
    pub namespace: NamespaceId,
    /// Full blob size in bytes (pre-erasure).
    pub size_bytes: u64,
    /// Numeric chain id the receipt is valid on.
    pub chain_id: u64,
    /// Merkle root of the active algorithm policy tree.
    pub policy_root: Digest32,
    /// Canonical signature algorithm id used by the signer.
    pub alg_id: u32,
    /// Signer address, kept lowercase for stable SignBytes.
    pub signer: String,
    pub signature: Vec<u8>,
    /// Unix seconds when the receipt was issued.
    pub timestamp: u64,
    /// Optional MIME hint; included in SignBytes but not in the commitment.
    pub mime: Option<String>,
}

impl BlobReceipt {
    fn base_map(&self) -> DaResult<Vec<(Value, Value)>> {
        if self.size_bytes > MAX_BLOB_BYTES as u64 {
            return Err(DaError::Validation("receipt size_bytes out of bounds".into()));
        }
        Ok(vec![
            (Value::from(1), Value::from(RECEIPT_DOMAIN_TAG)),
            (Value::from(2), Value::from(self.chain_id)),
            (Value::from(3), Value::Bytes(self.commitment.to_vec())),
            (Value::from(4), Value::from(self.namespace.value())),
            (Value::from(5), Value::from(self.size_bytes)),
            (
                Value::from(6),
                match &self.mime {
                    Some(m) => Value::from(m.as_str()),
                    None => Value::Null,
                },
            ),
            (Value::from(7), Value::Bytes(self.policy_root.to_vec())),
            (Value::from(8), Value::from(self.alg_id)),
            (Value::from(9), Value::from(self.signer.to_lowercase())),
            (Value::from(10), Value::from(self.timestamp)),
        ])
    }

    /// Canonical SignBytes: everything except the signature.
    pub fn signbytes(&self) -> DaResult<Vec<u8>> {
        encode_map(self.base_map()?)
    }

    /// Full wire receipt: SignBytes fields plus the signature under key 11.
    pub fn to_cbor(&self) -> DaResult<Vec<u8>> {
        let mut m = self.base_map()?;
        m.push((Value::from(11), Value::Bytes(self.signature.clone())));
        encode_map(m)
    }

    /// Parse a wire receipt.
    pub fn from_cbor(data: &[u8]) -> DaResult<Self> {
        let value: Value = ciborium::de::from_reader(data)
            .map_err(|e| DaError::Validation(format!("invalid receipt CBOR: {e}")))?;
        let Value::Map(entries) = value else {
            return Err(DaError::Validation("invalid receipt: not a map".into()));
        };

        let get = |key: u64| -> Option<Value> {
            entries
                .iter()
                .find(|(k, _)| {
                    matches!(k, Value::Integer(i)
                        if u64::try_from(*i).map_or(false, |v| v == key))
                })
                .map(|(_, v)| v.clone())
        };

        let tag = as_text(get(1), "domain tag")?;
        if tag != RECEIPT_DOMAIN_TAG {
            return Err(DaError::Validation("invalid receipt: bad domain tag".into()));
        }
        let mime = match get(6) {
            None | Some(Value::Null) => None,
            Some(v) => Some(as_text(Some(v), "mime")?),
        };
        Ok(Self {
            commitment: as_digest(get(3), "commitment")?,
            namespace: NamespaceId::try_from_u64(as_u64(get(4), "namespace")?)?,
            size_bytes: as_u64(get(5), "size")?,
            chain_id: as_u64(get(2), "chain id")?,
            policy_root: as_digest(get(7), "policy root")?,
            alg_id: u32::try_from(as_u64(get(8), "alg id")?)
                .map_err(|_| DaError::Validation("alg id out of range".into()))?,
            signer: as_text(get(9), "signer")?.to_lowercase(),
            signature: as_bytes(get(11), "signature")?,
            timestamp: as_u64(get(10), "timestamp")?,
            mime,
        })
    }

    /// Stable identifier for the receipt object itself (not the blob).
    pub fn object_id(&self) -> DaResult<Digest32> {
        Ok(sha3_256(&self.to_cbor()?))
    }
}

/* ------------------------------ Build / verify ------------------------------ */

/// Construct and sign a receipt with the provided signing callback.
#[allow(clippy::too_many_arguments)]
pub fn build_receipt(
    commitment: Digest32,
    namespace: NamespaceId,
    size_bytes: u64,
    chain_id: u64,
    policy_root: Digest32,
    alg_id: u32,
    signer_address: &str,
    timestamp: u64,
    mime: Option<String>,
    sign_fn: &SignFn<'_>,
) -> DaResult<BlobReceipt> {
    let mut receipt = BlobReceipt {
        commitment,
        namespace,
        size_bytes,
        chain_id,
        policy_root,
        alg_id,
        signer: signer_address.to_lowercase(),
        signature: Vec::new(),
        timestamp,
        mime,
    };
    let sb = receipt.signbytes()?;
    receipt.signature = sign_fn(alg_id, &receipt.signer, &sb)?;
    Ok(receipt)
}

/// Verify a receipt's signature and optional policy/chain bindings.
///
/// Binding mismatches fail before the signature is checked.
pub fn verify_receipt(
    receipt: &BlobReceipt,
    verify_fn: &VerifyFn<'_>,
    expect_policy_root: Option<&Digest32>,
    expect_chain_id: Option<u64>,
) -> DaResult<()> {
    if let Some(chain) = expect_chain_id {
        if receipt.chain_id != chain {
            return Err(DaError::InvalidProof("receipt chain_id mismatch".into()));
        }
    }
    if let Some(root) = expect_policy_root {
        if &receipt.policy_root != root {
            return Err(DaError::InvalidProof("receipt policy_root mismatch".into()));
        }
    }
    if receipt.size_bytes > MAX_BLOB_BYTES as u64 {
        return Err(DaError::Validation("receipt size_bytes out of bounds".into()));
    }
    let sb = receipt.signbytes()?;
    if !verify_fn(receipt.alg_id, &receipt.signer, &sb, &receipt.signature) {
        return Err(DaError::InvalidProof(
            "receipt signature verification failed".into(),
        ));
    }
    Ok(())
}

/* -------------------------------- CBOR helpers ------------------------------- */

fn encode_map(entries: Vec<(Value, Value)>) -> DaResult<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(&Value::Map(entries), &mut out)
        .map_err(|e| DaError::Validation(format!("receipt CBOR encode: {e}")))?;
    Ok(out)
}

fn as_u64(v: Option<Value>, what: &str) -> DaResult<u64> {
    match v {
        Some(Value::Integer(i)) => {
            u64::try_from(i).map_err(|_| DaError::Validation(format!("receipt {what} negative")))
        }
        _ => Err(DaError::Validation(format!("receipt missing {what}"))),
    }
}

fn as_text(v: Option<Value>, what: &str) -> DaResult<String> {
    match v {
        Some(Value::Text(s)) => Ok(s),
        _ => Err(DaError::Validation(format!("receipt missing {what}"))),
    }
}

fn as_bytes(v: Option<Value>, what: &str) -> DaResult<Vec<u8>> {
    match v {
        Some(Value::Bytes(b)) => Ok(b),
        _ => Err(DaError::Validation(format!("receipt missing {what}"))),
    }
}

fn as_digest(v: Option<Value>, what: &str) -> DaResult<Digest32> {
    let b = as_bytes(v, what)?;
    crate::utils::bytes::root_from_slice(&b)
}

/* --------------------------------- Tests ----------------------------------- */
