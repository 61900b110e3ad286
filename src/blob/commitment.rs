//! Blob commitment pipeline.
//!
//! Computes the canonical commitment for a payload: the NMT root over the
//! erasure-coded, namespaced leaves derived from it. The commitment is what
//! ultimately appears in headers (directly or aggregated) and is represented
//! by [`crate::blob::types::Commitment`].
//!
//! Sources are a sealed enum (bytes, a file path, or an arbitrary reader)
//! with one entry point each. The erasure encoder works over a contiguous
//! buffer, so file and reader sources are read fully (the soft size cap is
//! enforced while reading, before any hashing happens).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::constants::MAX_BLOB_BYTES;
use crate::erasure::encoder::{encode_blob_to_leaves, EncodeInfo};
use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};
use crate::nmt::commit::root_from_encoded_leaves;
use crate::nmt::namespace::NamespaceId;
use crate::utils::hash::sha3_256;

use super::types::{BlobMeta, Commitment};

/// Where the blob bytes come from.
pub enum Source<'a> {
    Bytes(&'a [u8]),
    File(PathBuf),
    Reader(Box<dyn Read + 'a>),
}

impl<'a> Source<'a> {
    /// Best-effort size hint without consuming the source.
    fn size_hint(&self) -> Option<u64> {
        match self {
            Source::Bytes(b) => Some(b.len() as u64),
            Source::File(p) => std::fs::metadata(p).ok().map(|m| m.len()),
            Source::Reader(_) => None,
        }
    }

    /// Materialize the payload, enforcing `max_bytes` as it is read.
    fn into_bytes(self, max_bytes: usize) -> DaResult<Vec<u8>> {
        match self {
            Source::Bytes(b) => {
                check_cap(b.len(), max_bytes)?;
                Ok(b.to_vec())
            }
            Source::File(p) => {
                let f = File::open(&p)?;
                read_capped(f, max_bytes)
            }
            Source::Reader(r) => read_capped(r, max_bytes),
        }
    }
}

fn check_cap(len: usize, max_bytes: usize) -> DaResult<()> {
    if len > max_bytes {
        return Err(DaError::Resource(format!(
            "blob too large: {len} > max {max_bytes}"
        )));
    }
    Ok(())
}

fn read_capped<R: Read>(mut r: R, max_bytes: usize) -> DaResult<Vec<u8>> {
    let mut buf = Vec::new();
    // Read one byte past the cap so oversized inputs are detected without
    // buffering them whole.
    let mut limited = r.by_ref().take(max_bytes as u64 + 1);
    limited.read_to_end(&mut buf)?;
    check_cap(buf.len(), max_bytes)?;
    Ok(buf)
}

/// Compute the canonical commitment for `source` under `namespace`.
///
/// Returns the commitment, the metadata record and the encoder geometry.
/// The namespace is validated against the user band; reserved ids are
/// refused here; system blobs use internal entry points.
pub fn commit(
    source: Source<'_>,
    namespace: NamespaceId,
    mime: Option<String>,
    params: &ErasureParams,
) -> DaResult<(Commitment, BlobMeta, EncodeInfo)> {
    if !namespace.is_user() {
        return Err(DaError::Namespace(format!(
            "namespace {namespace} is reserved; user blobs start at the user band"
        )));
    }

    // Preflight: refuse oversized sources before reading them whole.
    if let Some(hint) = source.size_hint() {
        check_cap(hint as usize, MAX_BLOB_BYTES)?;
    }
    let payload = source.into_bytes(MAX_BLOB_BYTES)?;

    let (leaves, info) = encode_blob_to_leaves(&payload, namespace, params)?;
    let root = if leaves.is_empty() {
        // Zero-leaf (empty) blob: commit to the empty byte string.
        sha3_256(b"")
    } else {
        root_from_encoded_leaves(leaves.iter().map(|l| l.as_slice()), true)?
    };

    let commitment = Commitment::new(namespace, root, payload.len() as u64);
    let meta = BlobMeta {
        namespace,
        size_bytes: payload.len() as u64,
        mime,
        data_shards: Some(params.data_shards as u32),
        total_shards: Some(params.total_shards as u32),
        share_bytes: Some(params.share_bytes as u32),
    };
    meta.validate()?;
    Ok((commitment, meta, info))
}

/// Commit an in-memory payload.
pub fn commit_bytes(
    data: &[u8],
    namespace: NamespaceId,
    mime: Option<String>,
    params: &ErasureParams,
) -> DaResult<(Commitment, BlobMeta, EncodeInfo)> {
    commit(Source::Bytes(data), namespace, mime, params)
}

/// Commit a file by path.
pub fn commit_file(
    path: impl AsRef<Path>,
    namespace: NamespaceId,
    mime: Option<String>,
    params: &ErasureParams,
) -> DaResult<(Commitment, BlobMeta, EncodeInfo)> {
    commit(
        Source::File(path.as_ref().to_path_buf()),
        namespace,
        mime,
        params,
    )
}

/* --------------------------------- Tests ----------------------------------- */
