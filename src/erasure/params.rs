//! Erasure-coding profile: RS(k, n) settings and deterministic sizing math.
//!
//! Encoding happens in fixed-width *stripes*: k data shards of `share_bytes`
//! each plus `n − k` parity shards. A blob occupies an integer number of
//! stripes; the final stripe is right-padded with zeros up to
//! `k * share_bytes`. The padding carries no meaning and is never exposed;
//! the exact blob length travels separately.

use serde::{Deserialize, Serialize};

use crate::constants::{ERASURE_K_DEFAULT, ERASURE_N_DEFAULT, SHARE_SIZE_DEFAULT, SHARE_SIZE_MAX};
use crate::error::{DaError, DaResult};

/// Validated erasure profile `(k, n, share_bytes)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErasureParams {
    /// k, the number of data shards per stripe.
    pub data_shards: usize,
    /// n, the total shards per stripe (n > k).
    pub total_shards: usize,
    /// Payload bytes per shard.
    pub share_bytes: usize,
}

impl ErasureParams {
    pub fn new(data_shards: usize, total_shards: usize, share_bytes: usize) -> DaResult<Self> {
        if data_shards == 0 {
            return Err(DaError::Validation("data_shards (k) must be >= 1".into()));
        }
        if total_shards <= data_shards {
            return Err(DaError::Validation(
                "total_shards (n) must be > data_shards (k)".into(),
            ));
        }
        // GF(2^8) row indices must stay within the field.
        if total_shards > 256 {
            return Err(DaError::Validation(
                "total_shards (n) must be <= 256 for GF(2^8) codes".into(),
            ));
        }
        if share_bytes == 0 {
            return Err(DaError::Validation("share_bytes must be >= 1".into()));
        }
        // The GF(2^8) bound above caps both shard counts far below the
        // ERASURE_K_MAX / ERASURE_N_MAX guard rails, so only the share size
        // needs its own check here.
        if share_bytes > SHARE_SIZE_MAX {
            return Err(DaError::Validation(
                "unreasonably large share_bytes; check configuration".into(),
            ));
        }
        Ok(Self {
            data_shards,
            total_shards,
            share_bytes,
        })
    }

    /// Canonical defaults: RS(32, 48) with 4 KiB shares.
    pub fn default_profile() -> Self {
        Self {
            data_shards: ERASURE_K_DEFAULT,
            total_shards: ERASURE_N_DEFAULT,
            share_bytes: SHARE_SIZE_DEFAULT,
        }
    }

    /* -------------------------- Derived properties ------------------------- */

    #[inline]
    pub const fn parity_shards(&self) -> usize {
        self.total_shards - self.data_shards
    }

    /// Code rate k/n, useful for capacity planning.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.data_shards as f64 / self.total_shards as f64
    }

    /// Usable payload per stripe before parity is added.
    #[inline]
    pub const fn stripe_payload_bytes(&self) -> usize {
        self.data_shards * self.share_bytes
    }

    /* ----------------------------- Sizing helpers --------------------------- */

    /// Stripes required to carry `blob_bytes` of payload (0 for an empty blob).
    pub fn stripes_for_blob(&self, blob_bytes: usize) -> usize {
        if blob_bytes == 0 {
            return 0;
        }
        let stripe = self.stripe_payload_bytes();
        (blob_bytes + stripe - 1) / stripe
    }

    /// Payload size after right-padding to a whole number of stripes.
    pub fn padded_payload_bytes(&self, blob_bytes: usize) -> usize {
        self.stripes_for_blob(blob_bytes) * self.stripe_payload_bytes()
    }

    /// `(data_total, parity_total, total)` shard counts for a blob.
    pub fn shards_for_blob(&self, blob_bytes: usize) -> (usize, usize, usize) {
        let stripes = self.stripes_for_blob(blob_bytes);
        let data = stripes * self.data_shards;
        let parity = stripes * self.parity_shards();
        (data, parity, data + parity)
    }
}

impl Default for ErasureParams {
    fn default() -> Self {
        Self::default_profile()
    }
}

/* --------------------------------- Tests ----------------------------------- */
