//! Light-client availability verification.
//!
//! A light client holds a header DA root and a sampling target. It derives a
//! [`SamplePlan`], draws leaf indices, fetches each share plus its inclusion
//! proof from a serving peer, and verifies every proof against the root.
//! A single failed fetch or verification rejects the blob; acceptance
//! additionally requires the verified count to meet the plan.
//!
//! Share-level sampling assumes a root computed in leaves mode. For
//! commitments-mode roots, availability degrades to per-commitment inclusion
//! checks; see [`LightClient::check_commitment`].

use tracing::{debug, info};

use crate::erasure::availability::{plan_samples_for_target, SamplePlan};
use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::nmt::proofs::InclusionProof;
use crate::nmt::verify::{verify_inclusion, verify_inclusion_from_encoded};
use crate::utils::hash::{payload_hash, Digest32};

/// Serves shares and inclusion proofs for a DA root.
///
/// Implementations fetch from the retrieval endpoints, gossip, or local
/// storage; the light client only needs this one method.
pub trait ShareProvider {
    /// Return the encoded leaf at `index` together with its inclusion proof
    /// under `root`.
    fn fetch_share(&self, root: &Digest32, index: usize) -> DaResult<(Vec<u8>, InclusionProof)>;
}

/// Outcome of a sampling round.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleReport {
    pub plan: SamplePlan,
    /// Indices actually drawn (may be fewer than the plan on tiny matrices).
    pub sampled: Vec<usize>,
    pub verified: usize,
    pub accepted: bool,
}

/// Sampling policy: target miss probability plus draw bounds.
#[derive(Clone, Debug)]
pub struct LightClient {
    pub p_fail_target: f64,
    /// Stripes assumed broken by the adversary model.
    pub stripes_broken: usize,
    /// Never draw fewer samples than this (0 disables the floor).
    pub min_samples: usize,
    /// Never draw more samples than this (0 disables the ceiling).
    pub max_samples: usize,
    /// Seed for reproducible draws; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for LightClient {
    fn default() -> Self {
        Self {
            p_fail_target: 2f64.powi(-40),
            stripes_broken: 1,
            min_samples: 0,
            max_samples: 0,
            seed: None,
        }
    }
}

impl LightClient {
    /// Derive the sampling plan for a blob of `stripes` stripes.
    pub fn plan(&self, params: &ErasureParams, stripes: usize) -> DaResult<SamplePlan> {
        plan_samples_for_target(params, stripes, self.p_fail_target, self.stripes_broken, true)
    }

    fn bounded_count(&self, planned: usize, total: usize) -> usize {
        let mut n = planned;
        if self.min_samples > 0 {
            n = n.max(self.min_samples);
        }
        if self.max_samples > 0 {
            n = n.min(self.max_samples);
        }
        n.min(total)
    }

    /// Sample a blob's shares against a leaves-mode DA root.
    ///
    /// Every drawn index is fetched and verified; any failure rejects. The
    /// result reports whether the verified count meets the plan.
    pub fn sample_blob<P: ShareProvider>(
        &self,
        provider: &P,
        root: &Digest32,
        params: &ErasureParams,
        stripes: usize,
    ) -> DaResult<SampleReport> {
        let plan = self.plan(params, stripes)?;
        let total = stripes * params.total_shards;
        let want = self.bounded_count(plan.samples, total);

        let sampled = super::plan::draw_uniform(total, want, self.seed)?;
        debug!(samples = sampled.len(), total, "sampling round starting");

        let mut verified = 0usize;
        for &index in &sampled {
            let (leaf, proof) = provider.fetch_share(root, index)?;
            if proof.leaf_index != index {
                return Err(DaError::InvalidProof(format!(
                    "provider returned proof for index {} instead of {index}",
                    proof.leaf_index
                )));
            }
            if !verify_inclusion_from_encoded(root, &proof, &leaf) {
                return Err(DaError::InvalidProof(format!(
                    "share at index {index} failed verification against the DA root"
                )));
            }
            verified += 1;
        }

        let accepted = verified == sampled.len() && verified >= want;
        info!(verified, want, accepted, "sampling round complete");
        Ok(SampleReport {
            plan,
            sampled,
            verified,
            accepted,
        })
    }

    /// Commitments-mode check: verify that `commitment` is bound into the
    /// block DA root as a leaf under `namespace`.
    pub fn check_commitment(
        &self,
        block_root: &Digest32,
        proof: &InclusionProof,
        namespace: NamespaceId,
        commitment: &Digest32,
    ) -> bool {
        // The leaf body is the 32-byte commitment itself.
        verify_inclusion(block_root, proof, namespace, &payload_hash(commitment))
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::core_chain::{compute_da_root, BlobInclusion, DaRootMode};
    use crate::erasure::encoder::encode_blob_to_leaves;
    use crate::nmt::codec::encode_leaf;
    use crate::nmt::proofs::build_inclusion;
    use crate::nmt::tree::NmtBuilder;

    fn ns(v: u32) -> NamespaceId {
        NamespaceId::new(v)
    }

    /// Provider backed by a fully available in-memory leaf set.
    struct HonestProvider {
        leaves: Vec<Vec<u8>>,
        tree: NmtBuilder,
    }

    impl HonestProvider {
        fn new(leaves: Vec<Vec<u8>>) -> Self {
            let mut tree = NmtBuilder::new();
            for leaf in &leaves {
                tree.append_encoded(leaf).unwrap();
            }
            tree.finalize().unwrap();
            Self { leaves, tree }
        }

        fn root(&mut self) -> Digest32 {
            self.tree.finalize().unwrap()
        }
    }

    impl ShareProvider for HonestProvider {
        fn fetch_share(&self, _root: &Digest32, index: usize) -> DaResult<(Vec<u8>, InclusionProof)> {
            let proof = build_inclusion(&self.tree, index)?;
            Ok((self.leaves[index].clone(), proof))
        }
    }

    /// Provider that withholds a set of indices.
    struct WithholdingProvider {
        inner: HonestProvider,
        withheld: Vec<usize>,
    }

    impl ShareProvider for WithholdingProvider {
        fn fetch_share(&self, root: &Digest32, index: usize) -> DaResult<(Vec<u8>, InclusionProof)> {
            if self.withheld.contains(&index) {
                return Err(DaError::NotFound(format!("share {index} withheld")));
            }
            self.inner.fetch_share(root, index)
        }
    }

    fn encoded_blob() -> (Vec<Vec<u8>>, ErasureParams, usize) {
        let params = ErasureParams::new(2, 4, 4).unwrap();
        let (leaves, info) =
            encode_blob_to_leaves(b"light client test payload!", ns(24), &params).unwrap();
        let stripes = info.stripes;
        (leaves, params, stripes)
    }

    #[test]
    fn accepts_fully_available_blob() {
        let (leaves, params, stripes) = encoded_blob();
        let mut provider = HonestProvider::new(leaves);
        let root = provider.root();

        let lc = LightClient {
            p_fail_target: 0.5,
            seed: Some(11),
            ..Default::default()
        };
        let report = lc.sample_blob(&provider, &root, &params, stripes).unwrap();
        assert!(report.accepted);
        assert_eq!(report.verified, report.sampled.len());
    }

    #[test]
    fn withheld_share_rejects_when_hit() {
        let (leaves, params, stripes) = encoded_blob();
        let total = leaves.len();
        let mut inner = HonestProvider::new(leaves);
        let root = inner.root();
        // Withhold everything: the first sampled index must fail.
        let provider = WithholdingProvider {
            inner,
            withheld: (0..total).collect(),
        };

        let lc = LightClient {
            p_fail_target: 0.5,
            min_samples: 4,
            seed: Some(5),
            ..Default::default()
        };
        let err = lc.sample_blob(&provider, &root, &params, stripes).unwrap_err();
        assert!(matches!(err, DaError::NotFound(_)));
    }

    #[test]
    fn corrupted_share_rejects() {
        let (leaves, params, stripes) = encoded_blob();
        let mut provider = HonestProvider::new(leaves);
        let root = provider.root();
        // Corrupt one byte of every served leaf body.
        struct Corrupting(HonestProvider);
        impl ShareProvider for Corrupting {
            fn fetch_share(
                &self,
                root: &Digest32,
                index: usize,
            ) -> DaResult<(Vec<u8>, InclusionProof)> {
                let (mut leaf, proof) = self.0.fetch_share(root, index)?;
                let last = leaf.len() - 1;
                leaf[last] ^= 0x01;
                Ok((leaf, proof))
            }
        }
        let corrupting = Corrupting(provider);

        let lc = LightClient {
            p_fail_target: 0.5,
            min_samples: 1,
            seed: Some(6),
            ..Default::default()
        };
        let err = lc
            .sample_blob(&corrupting, &root, &params, stripes)
            .unwrap_err();
        assert!(matches!(err, DaError::InvalidProof(_)));
    }

    #[test]
    fn sample_bounds_are_applied() {
        let (leaves, params, stripes) = encoded_blob();
        let total = leaves.len();
        let mut provider = HonestProvider::new(leaves);
        let root = provider.root();

        let lc = LightClient {
            p_fail_target: 1e-9, // plan far larger than the tiny matrix
            min_samples: 2,
            max_samples: 3,
            seed: Some(1),
            ..Default::default()
        };
        let report = lc.sample_blob(&provider, &root, &params, stripes).unwrap();
        assert!(report.sampled.len() <= 3.min(total));
    }

    #[test]
    fn commitments_mode_inclusion_check() {
        // Block root over per-blob commitment leaves.
        let incs = vec![
            BlobInclusion::without_leaves(ns(1), [0x11; 32], 100),
            BlobInclusion::without_leaves(ns(2), [0x22; 32], 50),
        ];
        let block_root = compute_da_root(&incs, DaRootMode::Commitments).unwrap();

        // Rebuild the commitment tree to extract an inclusion proof.
        let mut tree = NmtBuilder::new();
        for inc in &incs {
            tree.append_encoded(&encode_leaf(inc.namespace, &inc.commitment))
                .unwrap();
        }
        assert_eq!(tree.finalize().unwrap(), block_root);
        let proof = build_inclusion(&tree, 1).unwrap();

        let lc = LightClient::default();
        assert!(lc.check_commitment(&block_root, &proof, ns(2), &[0x22; 32]));
        assert!(!lc.check_commitment(&block_root, &proof, ns(2), &[0x23; 32]));
        assert!(!lc.check_commitment(&block_root, &proof, ns(3), &[0x22; 32]));
    }
}
