//! Blob layer: commitment pipeline, receipts, and the content-addressed store.
//!
//! - [`types`]      : `Commitment`, `BlobRef`, `BlobMeta`
//! - [`commitment`] : source → erasure leaves → NMT root → `(Commitment, BlobMeta)`
//! - [`receipt`]    : canonical-CBOR signed acceptance receipts
//! - [`index`]      : in-memory lookup mirror of the SQLite index
//! - [`store`]      : sharded FS payloads + SQLite index, pinning and GC

pub mod commitment;
pub mod index;
pub mod receipt;
pub mod store;
pub mod types;

pub use commitment::{commit, commit_bytes, commit_file, Source};
pub use index::IndexRecord;
pub use receipt::{build_receipt, verify_receipt, BlobReceipt};
pub use store::{BlobStore, GcOptions};
pub use types::{BlobMeta, BlobRef, Commitment};
