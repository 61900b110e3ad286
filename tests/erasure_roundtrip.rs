//! Erasure encode → lose shares → recover, across profiles and loss
//! patterns, plus the canonical HELLOWORLD recovery vector.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use animica_da::erasure::decoder::{decode_blob_from_records, DecodeOptions, LeafRecord};
use animica_da::erasure::encoder::encode_blob_to_leaves;
use animica_da::erasure::ErasureParams;
use animica_da::nmt::NamespaceId;

fn ns(v: u32) -> NamespaceId {
    NamespaceId::new(v)
}

fn records_keeping(
    leaves: &[Vec<u8>],
    n: usize,
    keep: &HashSet<usize>,
) -> Vec<LeafRecord> {
    leaves
        .iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(i, leaf)| LeafRecord {
            stripe: i / n,
            position: i % n,
            leaf: leaf.clone(),
        })
        .collect()
}

#[test]
fn helloworld_survives_any_two_losses_per_stripe() {
    // RS(2, 4), 4-byte shares: "HELLOWORLD" spans ceil(10/8) = 2 stripes.
    let params = ErasureParams::new(2, 4, 4).unwrap();
    let (leaves, info) = encode_blob_to_leaves(b"HELLOWORLD", ns(5), &params).unwrap();
    assert_eq!(info.stripes, 2);
    assert_eq!(leaves.len(), 8);

    // Every way of keeping exactly 2 of 4 leaves in each stripe.
    let pairs: Vec<(usize, usize)> = (0..4)
        .flat_map(|a| ((a + 1)..4).map(move |b| (a, b)))
        .collect();
    for &(a0, b0) in &pairs {
        for &(a1, b1) in &pairs {
            let keep: HashSet<usize> = [a0, b0, 4 + a1, 4 + b1].into_iter().collect();
            let records = records_keeping(&leaves, 4, &keep);
            let res = decode_blob_from_records(
                &records,
                &params,
                &DecodeOptions::strict().with_original_size(10),
            )
            .unwrap();
            assert_eq!(
                res.blob, b"HELLOWORLD",
                "kept {{{a0},{b0}}} and {{{},{}}}",
                4 + a1,
                4 + b1
            );
        }
    }
}

#[test]
fn random_blobs_random_losses() {
    let mut rng = StdRng::seed_from_u64(0xda7a);
    let profiles = [
        ErasureParams::new(2, 4, 16).unwrap(),
        ErasureParams::new(3, 5, 32).unwrap(),
        ErasureParams::new(4, 9, 64).unwrap(),
    ];

    for params in &profiles {
        for _ in 0..10 {
            let size = 1 + (rng.next_u32() as usize % (params.stripe_payload_bytes() * 3));
            let mut blob = vec![0u8; size];
            rng.fill_bytes(&mut blob);

            let (leaves, info) = encode_blob_to_leaves(&blob, ns(40), params).unwrap();
            let n = params.total_shards;

            // Keep a random k-subset per stripe.
            let mut keep = HashSet::new();
            for stripe in 0..info.stripes {
                let mut positions: Vec<usize> = (0..n).collect();
                positions.shuffle(&mut rng);
                for &p in positions.iter().take(params.data_shards) {
                    keep.insert(stripe * n + p);
                }
            }

            let records = records_keeping(&leaves, n, &keep);
            let res = decode_blob_from_records(
                &records,
                params,
                &DecodeOptions::strict().with_original_size(size),
            )
            .unwrap();
            assert_eq!(res.blob, blob, "profile {params:?} size {size}");
        }
    }
}

#[test]
fn below_threshold_fails_cleanly() {
    let params = ErasureParams::new(3, 5, 8).unwrap();
    let (leaves, _) = encode_blob_to_leaves(&[0x5a; 64], ns(40), &params).unwrap();

    // Keep only 2 < k leaves of stripe 0.
    let keep: HashSet<usize> = [0usize, 4].into_iter().collect();
    let records = records_keeping(&leaves, 5, &keep);
    let err = decode_blob_from_records(
        &records,
        &params,
        &DecodeOptions::strict().with_original_size(64),
    )
    .unwrap_err();
    assert_eq!(err.code(), "decode_failure");
}

#[test]
fn parity_only_recovery_with_known_size() {
    let params = ErasureParams::new(2, 5, 8).unwrap();
    let blob = b"parity shards alone are enough".to_vec();
    let (leaves, info) = encode_blob_to_leaves(&blob, ns(77), &params).unwrap();

    // Keep only parity positions (2..5 per stripe).
    let keep: HashSet<usize> = (0..info.total_leaves())
        .filter(|i| i % 5 >= 2)
        .collect();
    let records = records_keeping(&leaves, 5, &keep);
    let res = decode_blob_from_records(
        &records,
        &params,
        &DecodeOptions::strict().with_original_size(blob.len()),
    )
    .unwrap();
    assert_eq!(res.blob, blob);
}
