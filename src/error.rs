//! Typed error surface for the DA subsystem.
//!
//! Every error carries a stable machine code (snake_case) and a suggested
//! HTTP status so transport layers can map failures without string matching.
//! Pure components construct these directly; the retrieval service forwards
//! them onto the wire as `{ code, detail }` payloads.

use thiserror::Error;

/// Canonical error for the DA crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DaError {
    /// Malformed input: bad hex, bad varint, bad range header, size over cap.
    #[error("validation: {0}")]
    Validation(String),

    /// Unknown commitment / missing payload for an indexed row.
    #[error("not found: {0}")]
    NotFound(String),

    /// A proof failed verification or could not be constructed for the
    /// requested indices.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// Namespace id out of bounds or inside a reserved band where a user id
    /// was required.
    #[error("namespace out of range: {0}")]
    Namespace(String),

    /// Erasure recovery failed: fewer than k leaves in a stripe, or a
    /// singular decode submatrix.
    #[error("decode failure: {0}")]
    Decode(String),

    /// Illegal state transition, e.g. appending to a finalized tree or
    /// pinning an absent root.
    #[error("state: {0}")]
    State(String),

    /// Resource bound exceeded: request body over the soft cap, or a rate
    /// limit rejection (with a retry hint in seconds).
    #[error("resource exhausted: {0}")]
    Resource(String),

    /// Indexed payload no longer matches its commitment. Reported distinctly
    /// from `NotFound` and `InvalidProof` so operators can page on it.
    #[error("store corruption: {0}")]
    StoreCorruption(String),

    /// Filesystem or database failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite failure inside the blob store.
    #[error("db: {0}")]
    Db(#[from] rusqlite::Error),

    /// Transport failure in the retrieval client.
    #[error("http: {0}")]
    Http(String),
}

impl DaError {
    /// Stable machine-readable code for wire payloads.
    pub fn code(&self) -> &'static str {
        match self {
            DaError::Validation(_) => "validation",
            DaError::NotFound(_) => "not_found",
            DaError::InvalidProof(_) => "invalid_proof",
            DaError::Namespace(_) => "namespace_out_of_range",
            DaError::Decode(_) => "decode_failure",
            DaError::State(_) => "state",
            DaError::Resource(_) => "resource_exhausted",
            DaError::StoreCorruption(_) => "store_corruption",
            DaError::Io(_) => "io",
            DaError::Db(_) => "io",
            DaError::Http(_) => "http",
        }
    }

    /// Suggested HTTP status for transport layers.
    pub fn http_status(&self) -> u16 {
        match self {
            DaError::Validation(_) => 400,
            DaError::NotFound(_) => 404,
            DaError::InvalidProof(_) => 422,
            DaError::Namespace(_) => 400,
            DaError::Decode(_) => 422,
            DaError::State(_) => 409,
            DaError::Resource(_) => 429,
            DaError::StoreCorruption(_) => 500,
            DaError::Io(_) | DaError::Db(_) | DaError::Http(_) => 500,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type DaResult<T> = Result<T, DaError>;

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DaError::Validation("x".into()).code(), "validation");
        assert_eq!(DaError::NotFound("x".into()).code(), "not_found");
        assert_eq!(DaError::InvalidProof("x".into()).code(), "invalid_proof");
        assert_eq!(DaError::StoreCorruption("x".into()).code(), "store_corruption");
    }

    #[test]
    fn statuses_map_sensibly() {
        assert_eq!(DaError::NotFound("x".into()).http_status(), 404);
        assert_eq!(DaError::InvalidProof("x".into()).http_status(), 422);
        assert_eq!(DaError::Resource("x".into()).http_status(), 429);
        assert_eq!(DaError::StoreCorruption("x".into()).http_status(), 500);
    }
}
