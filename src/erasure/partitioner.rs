//! Blob partitioning into fixed-size data shards.
//!
//! Splits a raw blob into payload slices of exactly `share_bytes`, arranged
//! in stripes of `k` shards, while preserving each slice's *meaningful*
//! length for namespaced-leaf encoding. Only the final stripe can contain a
//! short (or pure-padding) shard; earlier shards are always full.
//!
//! Parity shards are not produced here; see [`crate::erasure::encoder`] for
//! the full blob → (data+parity) → leaves pipeline.

use crate::erasure::params::ErasureParams;

/// One fixed-size payload slice ready for the RS encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataShard {
    /// 0-based index among data shards (k per stripe, then next stripe).
    pub index: usize,
    /// Exactly `share_bytes` long, right-padded with zeros when needed.
    pub payload: Vec<u8>,
    /// Number of meaningful bytes in `payload` (≤ share_bytes).
    pub data_len: usize,
    /// Stripe this shard belongs to (0-based).
    pub stripe: usize,
    /// Position within the stripe, `0..k`.
    pub offset_in_stripe: usize,
}

impl DataShard {
    /// True iff the shard carries no payload at all (pure right padding).
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.data_len == 0
    }

    /// The meaningful portion of the payload (what a data leaf embeds).
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.payload[..self.data_len]
    }
}

/// Split `blob` into data shards of `params.share_bytes`, k per stripe.
///
/// Returns `stripes * k` shards; an empty blob yields an empty vector.
pub fn partition_blob(blob: &[u8], params: &ErasureParams) -> Vec<DataShard> {
    let k = params.data_shards;
    let b = params.share_bytes;
    if blob.is_empty() {
        return Vec::new();
    }

    let stripes = params.stripes_for_blob(blob.len());
    let mut shards = Vec::with_capacity(stripes * k);
    let mut pos = 0usize;

    for stripe in 0..stripes {
        for off in 0..k {
            let remaining = blob.len().saturating_sub(pos);
            let data_len = remaining.min(b);
            let mut payload = Vec::with_capacity(b);
            payload.extend_from_slice(&blob[pos..pos + data_len]);
            payload.resize(b, 0);
            shards.push(DataShard {
                index: stripe * k + off,
                payload,
                data_len,
                stripe,
                offset_in_stripe: off,
            });
            pos += data_len;
        }
    }
    shards
}

/// Total number of data shards required to carry a blob of `blob_len` bytes.
pub fn data_shard_count_for_blob(blob_len: usize, params: &ErasureParams) -> usize {
    params.stripes_for_blob(blob_len) * params.data_shards
}

/* --------------------------------- Tests ----------------------------------- */
