//! animica_da: the Animica Data Availability engine.
//!
//! The crate is a layered pipeline. Lower layers are pure functions; upper
//! layers compose them with filesystem and network I/O:
//!
//! - [`utils`]    : SHA3 wrappers, domain-tagged hashing, hex and uvarint codecs
//! - [`nmt`]      : Namespaced Merkle Tree: leaf codec, builder, inclusion and
//!   namespace-range proofs, fail-closed verification
//! - [`erasure`]  : systematic RS(k, n) over GF(2⁸), stripe partitioning,
//!   encode, decode-from-any-k, matrix layout, availability math
//! - [`blob`]     : commitment pipeline, signed receipts, and the
//!   content-addressed store (sharded FS + SQLite index, pin/unpin, GC)
//! - [`adapters`] : block-level DA root computation and gossip topic grammar
//! - [`retrieval`]: post/get/proof orchestration, range handling, rate
//!   limiting, and the async HTTP client
//! - [`sampling`] : DAS sample planning and the light-client verify loop
//!
//! Write path: payload + namespace → erasure encoder emits ordered namespaced
//! leaves (k data + p parity per stripe) → NMT root becomes the blob
//! *commitment* → store persists the original bytes keyed by that root.
//!
//! All digests are SHA3-256. All hex is lowercase `0x…`. Leaves are encoded
//! as `ns_be || uvarint(len) || data` with a 4-byte big-endian namespace.

#![deny(rust_2018_idioms, unused_must_use)]
#![forbid(unsafe_code)]

pub mod adapters;
pub mod blob;
pub mod config;
pub mod constants;
pub mod erasure;
pub mod error;
pub mod nmt;
pub mod retrieval;
pub mod sampling;
pub mod utils;

pub use config::DaConfig;
pub use error::{DaError, DaResult};
