//! Adapters binding the DA engine to its neighbors: the core chain (block
//! header DA root) and the gossip layer (topic grammar).

pub mod core_chain;
pub mod p2p_topics;

pub use core_chain::{
    compute_da_root, inclusions_from_commitments, inclusions_from_leaves, validate_da_root,
    BlobInclusion, DaRootMode,
};
pub use p2p_topics::{build_topic, parse_topic, TopicKind, TopicParts};
