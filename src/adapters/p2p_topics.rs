//! Canonical gossip topic strings for DA messages.
//!
//! Topics are human-readable, versioned and chain-scoped:
//!
//! ```text
//! animica/da/<version>/chain/<chainId>/<kind>[/ns/<namespace>]
//! ```
//!
//! Kinds:
//! - `commitment` : announce new blob commitments becoming available
//! - `shares`     : advertise share/range availability
//! - `samples`    : publish DAS sample responses (indices + branches)
//!
//! Renaming a kind or changing the shape is a consensus-adjacent change for
//! network tooling; bump [`TOPIC_VERSION`] instead.

use std::fmt;

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;

pub const TOPIC_PREFIX: &str = "animica/da";
pub const TOPIC_VERSION: u32 = 1;

/// DA gossip message kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopicKind {
    Commitment,
    Shares,
    Samples,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Commitment => "commitment",
            TopicKind::Shares => "shares",
            TopicKind::Samples => "samples",
        }
    }

    fn parse(s: &str) -> DaResult<Self> {
        match s {
            "commitment" => Ok(TopicKind::Commitment),
            "shares" => Ok(TopicKind::Shares),
            "samples" => Ok(TopicKind::Samples),
            other => Err(DaError::Validation(format!("unknown DA topic kind {other:?}"))),
        }
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of a parsed topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopicParts {
    pub version: u32,
    pub chain_id: u64,
    pub kind: TopicKind,
    pub namespace: Option<NamespaceId>,
}

/// Build a canonical DA gossip topic string.
pub fn build_topic(kind: TopicKind, chain_id: u64, namespace: Option<NamespaceId>) -> String {
    let base = format!("{TOPIC_PREFIX}/v{TOPIC_VERSION}/chain/{chain_id}/{}", kind.as_str());
    match namespace {
        Some(ns) => format!("{base}/ns/{ns}"),
        None => base,
    }
}

/// Topic for announcing new blob commitments.
pub fn commitment_topic(chain_id: u64) -> String {
    build_topic(TopicKind::Commitment, chain_id, None)
}

/// Topic for share/range availability announcements.
pub fn shares_topic(chain_id: u64, namespace: Option<NamespaceId>) -> String {
    build_topic(TopicKind::Shares, chain_id, namespace)
}

/// Topic for DAS sample responses.
pub fn samples_topic(chain_id: u64, namespace: Option<NamespaceId>) -> String {
    build_topic(TopicKind::Samples, chain_id, namespace)
}

/// Parse a topic string back into structured components.
pub fn parse_topic(topic: &str) -> DaResult<TopicParts> {
    let invalid = || DaError::Validation(format!("invalid DA topic {topic:?}"));

    let rest = topic.strip_prefix(TOPIC_PREFIX).ok_or_else(invalid)?;
    let rest = rest.strip_prefix('/').ok_or_else(invalid)?;
    let mut parts = rest.split('/');

    let version_part = parts.next().ok_or_else(invalid)?;
    let version: u32 = version_part
        .strip_prefix('v')
        .and_then(|v| v.parse().ok())
        .ok_or_else(invalid)?;

    if parts.next() != Some("chain") {
        return Err(invalid());
    }
    let chain_id: u64 = parts
        .next()
        .and_then(|c| c.parse().ok())
        .ok_or_else(invalid)?;

    let kind = TopicKind::parse(parts.next().ok_or_else(invalid)?)?;

    let namespace = match parts.next() {
        None => None,
        Some("ns") => {
            let ns_str = parts.next().ok_or_else(invalid)?;
            // Reject non-canonical digits like "+5" or "05".
            if ns_str.is_empty()
                || !ns_str.bytes().all(|b| b.is_ascii_digit())
                || (ns_str.len() > 1 && ns_str.starts_with('0'))
            {
                return Err(invalid());
            }
            Some(NamespaceId::new(ns_str.parse().map_err(|_| invalid())?))
        }
        Some(_) => return Err(invalid()),
    };
    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(TopicParts {
        version,
        chain_id,
        kind,
        namespace,
    })
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_canonical_strings() {
        assert_eq!(commitment_topic(1337), "animica/da/v1/chain/1337/commitment");
        assert_eq!(
            samples_topic(1, Some(NamespaceId::new(24))),
            "animica/da/v1/chain/1/samples/ns/24"
        );
        assert_eq!(shares_topic(2, None), "animica/da/v1/chain/2/shares");
    }

    #[test]
    fn roundtrip() {
        for topic in [
            commitment_topic(1),
            shares_topic(2, Some(NamespaceId::new(0))),
            samples_topic(1337, Some(NamespaceId::new(u32::MAX))),
        ] {
            let parts = parse_topic(&topic).unwrap();
            assert_eq!(build_topic(parts.kind, parts.chain_id, parts.namespace), topic);
        }
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "animica/da/v1/chain/1/unknown",
            "animica/da/1/chain/1/commitment",
            "animica/da/v1/chain/x/commitment",
            "animica/da/v1/commitment",
            "animica/da/v1/chain/1/samples/ns",
            "animica/da/v1/chain/1/samples/ns/05",
            "animica/da/v1/chain/1/samples/ns/5/extra",
            "other/da/v1/chain/1/commitment",
        ] {
            assert!(parse_topic(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn version_bump_is_a_wire_change() {
        let parts = parse_topic("animica/da/v2/chain/1/commitment").unwrap();
        assert_eq!(parts.version, 2);
        assert_ne!(parts.version, TOPIC_VERSION);
    }
}
