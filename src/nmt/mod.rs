//! Namespaced Merkle Tree (NMT).
//!
//! Leaves carry a 32-bit namespace id; every inner node carries both a hash
//! and the namespace range covered by its subtree, so verifiers can check
//! completeness of namespace queries. The canonical hashing rules live in
//! [`node`], the wire leaf encoding in [`codec`], construction in [`tree`],
//! proof building in [`proofs`] and fail-closed verification in [`verify`].
//!
//! The leaf sequence MUST be appended in non-decreasing namespace order for
//! range proofs to be sound; the builder records leaves verbatim and the
//! verifiers enforce the ordering at every combine step.

pub mod codec;
pub mod commit;
pub mod namespace;
pub mod node;
pub mod proofs;
pub mod tree;
pub mod verify;

pub use codec::{decode_leaf, decode_one, encode_leaf, payload_hash_from_encoded};
pub use commit::{root_from_encoded_leaves, root_from_ns_and_hashes, root_from_ns_and_payloads};
pub use namespace::{NamespaceId, NamespaceRange};
pub use proofs::{InclusionProof, RangeProof, SiblingStep, Side};
pub use tree::NmtBuilder;
