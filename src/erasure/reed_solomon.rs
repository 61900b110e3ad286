//! Systematic Reed–Solomon RS(k, n) over GF(2⁸).
//!
//! Generator matrix (shape n×k):
//!
//! ```text
//! G = [ I_k ]        data rows are the identity
//!     [  V  ]        V[r][j] = α^(r·j),  r ∈ [0, n−k),  j ∈ [0, k)
//! ```
//!
//! Encoding computes `P = V · D` column-wise over the field. Decoding from
//! any k shards at known positions selects the matching k rows of `G`,
//! inverts the k×k submatrix once, and applies it to every byte column.
//!
//! The construction (field 0x11D, α = 2, Vandermonde parity rows) is
//! consensus-visible through leaf hashes and therefore frozen; the test
//! vectors at the bottom pin it.

use std::collections::BTreeMap;

use crate::erasure::gf256;
use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};

/// Parity rows `V` of the generator matrix (shape p×k).
fn vandermonde_rows(params: &ErasureParams) -> Vec<Vec<u8>> {
    let k = params.data_shards;
    let p = params.parity_shards();
    (0..p)
        .map(|r| (0..k).map(|j| gf256::alpha_pow(r * j)).collect())
        .collect()
}

/// Row `i` of the full generator matrix `G` (`i < n`).
fn generator_row(params: &ErasureParams, i: usize) -> Vec<u8> {
    let k = params.data_shards;
    if i < k {
        let mut row = vec![0u8; k];
        row[i] = 1;
        row
    } else {
        let r = i - k;
        (0..k).map(|j| gf256::alpha_pow(r * j)).collect()
    }
}

fn check_shard_lengths(shards: &[Vec<u8>], expected: usize) -> DaResult<()> {
    for (i, s) in shards.iter().enumerate() {
        if s.len() != expected {
            return Err(DaError::Validation(format!(
                "shard {i} length {} != share_bytes {expected}",
                s.len()
            )));
        }
    }
    Ok(())
}

/// Compute the `n − k` parity shards for one stripe of `k` data shards.
///
/// Every input shard must be exactly `share_bytes` long (the partitioner
/// right-pads the tail shard before parity computation).
pub fn rs_encode(data_shards: &[Vec<u8>], params: &ErasureParams) -> DaResult<Vec<Vec<u8>>> {
    if data_shards.len() != params.data_shards {
        return Err(DaError::Validation(format!(
            "expected {} data shards, got {}",
            params.data_shards,
            data_shards.len()
        )));
    }
    check_shard_lengths(data_shards, params.share_bytes)?;
    let v = vandermonde_rows(params);
    Ok(gf256::mat_mul(&v, data_shards, params.share_bytes))
}

/// Reconstruct the `k` data shards of one stripe from any `k` shards at known
/// positions.
///
/// `shards` maps stripe position (`0..n`, data rows first) to the shard
/// payload, each exactly `share_bytes` long. Exactly the first `k` positions
/// in ascending order are used; extra entries are ignored.
pub fn rs_decode(
    shards: &BTreeMap<usize, Vec<u8>>,
    params: &ErasureParams,
) -> DaResult<Vec<Vec<u8>>> {
    let k = params.data_shards;
    let n = params.total_shards;
    if shards.len() < k {
        return Err(DaError::Decode(format!(
            "need at least {k} shards to decode, got {}",
            shards.len()
        )));
    }
    if let Some(&pos) = shards.keys().find(|&&p| p >= n) {
        return Err(DaError::Validation(format!(
            "shard position {pos} out of range (0..{n})"
        )));
    }

    // Deterministic selection: the k lowest positions present.
    let selected: Vec<(usize, &Vec<u8>)> = shards.iter().take(k).map(|(&i, s)| (i, s)).collect();

    // Fast path: all data rows present, nothing to invert.
    if selected.iter().all(|(i, _)| *i < k) {
        let mut out = Vec::with_capacity(k);
        for (_, s) in &selected {
            if s.len() != params.share_bytes {
                return Err(DaError::Validation("shard length mismatch".into()));
            }
            out.push((*s).clone());
        }
        return Ok(out);
    }

    let rows: Vec<Vec<u8>> = selected.iter().map(|(i, _)| generator_row(params, *i)).collect();
    let picked: Vec<Vec<u8>> = selected
        .iter()
        .map(|(_, s)| {
            if s.len() != params.share_bytes {
                return Err(DaError::Validation("shard length mismatch".into()));
            }
            Ok((*s).clone())
        })
        .collect::<DaResult<_>>()?;

    let inverse = gf256::invert_matrix(&rows)?;
    Ok(gf256::mat_mul(&inverse, &picked, params.share_bytes))
}

/// Recompute parity from data shards and compare with the provided parity.
pub fn rs_verify(shards: &[Vec<u8>], params: &ErasureParams) -> DaResult<bool> {
    if shards.len() != params.total_shards {
        return Err(DaError::Validation(format!(
            "expected {} shards, got {}",
            params.total_shards,
            shards.len()
        )));
    }
    check_shard_lengths(shards, params.share_bytes)?;
    let parity = rs_encode(&shards[..params.data_shards], params)?;
    Ok(parity
        .iter()
        .zip(&shards[params.data_shards..])
        .all(|(a, b)| *a == *b))
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    fn params(k: usize, n: usize, b: usize) -> ErasureParams {
        ErasureParams::new(k, n, b).unwrap()
    }

    #[test]
    fn parity_vectors_frozen() {
        // RS(2, 4), share_bytes = 4, data = "HELL" / "OWOR".
        // V rows: [1, 1] and [1, α] with α = 2, so
        //   parity0 = d0 ⊕ d1
        //   parity1 = d0 ⊕ 2·d1
        let p = params(2, 4, 4);
        let data = vec![b"HELL".to_vec(), b"OWOR".to_vec()];
        let parity = rs_encode(&data, &p).unwrap();
        assert_eq!(parity[0], vec![0x07, 0x12, 0x03, 0x1e]);
        assert_eq!(parity[1], vec![0xd6, 0xeb, 0xd2, 0xe8]);
    }

    #[test]
    fn encode_rejects_bad_shapes() {
        let p = params(2, 4, 4);
        assert!(rs_encode(&[b"HELL".to_vec()], &p).is_err());
        assert!(rs_encode(&[b"HELL".to_vec(), b"TOOLONG!".to_vec()], &p).is_err());
    }

    #[test]
    fn decode_from_parity_only() {
        let p = params(2, 4, 4);
        let data = vec![b"HELL".to_vec(), b"OWOR".to_vec()];
        let parity = rs_encode(&data, &p).unwrap();

        let mut shards = BTreeMap::new();
        shards.insert(2, parity[0].clone());
        shards.insert(3, parity[1].clone());
        let recovered = rs_decode(&shards, &p).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn decode_from_every_k_subset() {
        let p = params(3, 6, 8);
        let mut rng = StdRng::seed_from_u64(7);
        let mut data = vec![vec![0u8; 8]; 3];
        for s in &mut data {
            rng.fill_bytes(s);
        }
        let parity = rs_encode(&data, &p).unwrap();
        let all: Vec<Vec<u8>> = data.iter().cloned().chain(parity.iter().cloned()).collect();

        // Every 3-subset of the 6 positions must recover the data.
        for a in 0..6 {
            for b in (a + 1)..6 {
                for c in (b + 1)..6 {
                    let mut shards = BTreeMap::new();
                    for &i in &[a, b, c] {
                        shards.insert(i, all[i].clone());
                    }
                    let rec = rs_decode(&shards, &p).unwrap();
                    assert_eq!(rec, data, "subset {{{a},{b},{c}}}");
                }
            }
        }
    }

    #[test]
    fn decode_needs_k_shards() {
        let p = params(2, 4, 4);
        let mut shards = BTreeMap::new();
        shards.insert(1usize, b"OWOR".to_vec());
        assert!(matches!(rs_decode(&shards, &p), Err(DaError::Decode(_))));
        shards.insert(9, b"XXXX".to_vec());
        assert!(rs_decode(&shards, &p).is_err());
    }

    #[test]
    fn verify_detects_corruption() {
        let p = params(2, 4, 4);
        let data = vec![b"HELL".to_vec(), b"OWOR".to_vec()];
        let parity = rs_encode(&data, &p).unwrap();
        let mut all: Vec<Vec<u8>> = data.into_iter().chain(parity).collect();
        assert!(rs_verify(&all, &p).unwrap());
        all[2][0] ^= 0x01;
        assert!(!rs_verify(&all, &p).unwrap());
    }
}
