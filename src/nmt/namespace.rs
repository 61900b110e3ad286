//! Namespace id type and range checks.
//!
//! A *namespace* is a non-negative 32-bit integer used to partition blob
//! shares in the NMT. A reserved low band `[0, 15]` is kept for
//! protocol/system use; everything from [`crate::constants::NAMESPACE_USER_MIN`]
//! up is user-allocatable.

use serde::{Deserialize, Serialize};

use crate::constants::{NAMESPACE_RESERVED_MAX, NAMESPACE_USER_MIN, NS_BYTES};
use crate::error::{DaError, DaResult};

/// Validated namespace identifier.
///
/// The inner value is always within `[0, 2^NAMESPACE_BITS)`; at the current
/// 32-bit width every `u32` is representable, so construction is infallible
/// from `u32` and checked from wider integers and strings.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NamespaceId(u32);

impl NamespaceId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Parse from a decimal or `0x`-prefixed hex string.
    pub fn parse(s: &str) -> DaResult<Self> {
        let t = s.trim();
        let v = if let Some(hexpart) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            u32::from_str_radix(hexpart, 16)
        } else {
            t.parse::<u32>()
        }
        .map_err(|e| DaError::Namespace(format!("invalid namespace id {t:?}: {e}")))?;
        Ok(Self(v))
    }

    /// Checked conversion from a wider integer.
    pub fn try_from_u64(v: u64) -> DaResult<Self> {
        u32::try_from(v)
            .map(Self)
            .map_err(|_| DaError::Namespace(format!("namespace id {v} exceeds {}", u32::MAX)))
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Fixed-width big-endian encoding used in leaf bytes and hash preimages.
    #[inline]
    pub fn to_be_bytes(self) -> [u8; NS_BYTES] {
        self.0.to_be_bytes()
    }

    /// Decode from a fixed-width big-endian slice.
    pub fn from_be_slice(b: &[u8]) -> DaResult<Self> {
        if b.len() != NS_BYTES {
            return Err(DaError::Namespace(format!(
                "namespace field must be {NS_BYTES} bytes, got {}",
                b.len()
            )));
        }
        let mut arr = [0u8; NS_BYTES];
        arr.copy_from_slice(b);
        Ok(Self(u32::from_be_bytes(arr)))
    }

    /// True if the id lies in the reserved band (which starts at 0).
    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 <= NAMESPACE_RESERVED_MAX
    }

    /// True if the id is user-allocatable.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 >= NAMESPACE_USER_MIN
    }
}

impl From<u32> for NamespaceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl std::fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lift a reserved id into the user band; user ids pass through unchanged.
pub fn clamp_to_user(ns: NamespaceId) -> NamespaceId {
    NamespaceId(ns.0.max(NAMESPACE_USER_MIN))
}

/// Return the next user namespace after `prev` (or the first one for `None`).
pub fn next_user_namespace(prev: Option<NamespaceId>) -> DaResult<NamespaceId> {
    match prev {
        None => Ok(NamespaceId(NAMESPACE_USER_MIN)),
        Some(p) => {
            let n = p
                .0
                .checked_add(1)
                .ok_or_else(|| DaError::Namespace("exhausted namespace id space".into()))?;
            Ok(NamespaceId(n.max(NAMESPACE_USER_MIN)))
        }
    }
}

/* ------------------------------ NamespaceRange ----------------------------- */

/// A validated closed interval `[min, max]` of namespace ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceRange {
    min: NamespaceId,
    max: NamespaceId,
}

impl NamespaceRange {
    pub fn new(min: NamespaceId, max: NamespaceId) -> DaResult<Self> {
        if min > max {
            return Err(DaError::Namespace(format!(
                "namespace range must satisfy min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    /// Degenerate single-id range, as carried by every leaf.
    #[inline]
    pub const fn point(ns: NamespaceId) -> Self {
        Self { min: ns, max: ns }
    }

    #[inline]
    pub const fn min(&self) -> NamespaceId {
        self.min
    }

    #[inline]
    pub const fn max(&self) -> NamespaceId {
        self.max
    }

    /// Number of distinct ids covered by the range.
    #[inline]
    pub fn width(&self) -> u64 {
        u64::from(self.max.0) - u64::from(self.min.0) + 1
    }

    #[inline]
    pub fn contains(&self, ns: NamespaceId) -> bool {
        self.min <= ns && ns <= self.max
    }

    /// Smallest range covering both operands. Never fails: unions of valid
    /// ranges are valid.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Minimal range covering all given ids. Errors on an empty iterator.
pub fn compute_range<I>(namespaces: I) -> DaResult<NamespaceRange>
where
    I: IntoIterator<Item = NamespaceId>,
{
    let mut it = namespaces.into_iter();
    let first = it
        .next()
        .ok_or_else(|| DaError::Namespace("cannot compute range over empty set".into()))?;
    let mut rng = NamespaceRange::point(first);
    for ns in it {
        rng = rng.union(&NamespaceRange::point(ns));
    }
    Ok(rng)
}

/* --------------------------------- Tests ----------------------------------- */
