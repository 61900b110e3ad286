//! Request/response helpers shared by retrieval transports.
//!
//! - commitment hex normalization and strong ETags bound to the commitment
//! - single-range `Range: bytes=…` parsing and `Content-Range` rendering
//!
//! Only a single byte range is supported; multi-range requests are rejected.
//! These helpers are framework-free so services, clients and tests share one
//! implementation.

use crate::error::{DaError, DaResult};

/// Normalize a commitment hex string: trim, drop an optional `0x`, lowercase,
/// and validate characters and minimum length.
pub fn normalize_commitment_hex(s: &str) -> DaResult<String> {
    let t = s.trim().to_ascii_lowercase();
    let t = t.strip_prefix("0x").unwrap_or(&t);
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DaError::Validation("invalid commitment (non-hex)".into()));
    }
    // 32-byte roots are canonical; accept ≥16 bytes to stay future-proof.
    if t.len() < 32 {
        return Err(DaError::Validation("commitment too short".into()));
    }
    Ok(t.to_string())
}

/// Strong ETag for a DA artifact bound to its commitment.
pub fn etag_for_commitment(commitment_hex: &str) -> DaResult<String> {
    let ch = normalize_commitment_hex(commitment_hex)?;
    Ok(format!("\"da-{ch}\""))
}

/// True when an `If-None-Match` header matches the artifact's ETag.
pub fn if_none_match_hits(header: Option<&str>, etag: &str) -> bool {
    match header {
        Some(h) => h.trim() == etag || h.trim() == "*",
        None => false,
    }
}

/* --------------------------------- Ranges ----------------------------------- */

/// A satisfiable single byte range within an object of known length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeSpec {
    /// Inclusive start offset.
    pub start: u64,
    /// Inclusive end offset.
    pub end: u64,
    /// Total object length.
    pub length: u64,
}

impl RangeSpec {
    /// Number of bytes the range covers.
    #[inline]
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value.
    pub fn to_content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.length)
    }
}

/// Parse a single-range header (`bytes=START-`, `bytes=START-END`,
/// `bytes=-SUFFIX`) against an object of `total_length` bytes.
///
/// `None` means no range was requested (serve the full object). Multiple
/// ranges, unknown units and unsatisfiable ranges are validation errors.
pub fn parse_range_header(header: Option<&str>, total_length: u64) -> DaResult<Option<RangeSpec>> {
    let Some(raw) = header else {
        return Ok(None);
    };
    let hdr: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if hdr.is_empty() {
        return Ok(None);
    }
    let spec = hdr
        .strip_prefix("bytes=")
        .ok_or_else(|| DaError::Validation("unsupported Range unit".into()))?;
    if spec.contains(',') {
        return Err(DaError::Validation("multiple ranges not supported".into()));
    }

    // "-SUFFIX": the last N bytes.
    if let Some(suffix) = spec.strip_prefix('-') {
        let n: u64 = suffix
            .parse()
            .map_err(|_| DaError::Validation("invalid Range suffix".into()))?;
        if n == 0 {
            return Err(DaError::Validation("invalid suffix length".into()));
        }
        if total_length == 0 {
            return Err(DaError::Validation("range on empty resource".into()));
        }
        let n = n.min(total_length);
        return Ok(Some(RangeSpec {
            start: total_length - n,
            end: total_length - 1,
            length: total_length,
        }));
    }

    let (start_s, end_s) = spec
        .split_once('-')
        .ok_or_else(|| DaError::Validation("invalid Range (missing '-')".into()))?;
    let start: u64 = start_s
        .parse()
        .map_err(|_| DaError::Validation("invalid Range start".into()))?;
    if start >= total_length {
        return Err(DaError::Validation("Range start out of bounds".into()));
    }
    let end = if end_s.is_empty() {
        total_length - 1
    } else {
        let e: u64 = end_s
            .parse()
            .map_err(|_| DaError::Validation("invalid Range end".into()))?;
        if e < start {
            return Err(DaError::Validation("Range end < start".into()));
        }
        e.min(total_length - 1)
    };

    Ok(Some(RangeSpec {
        start,
        end,
        length: total_length,
    }))
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_normalization() {
        let h = "0xAABBCCDDEEFF00112233445566778899";
        assert_eq!(
            normalize_commitment_hex(h).unwrap(),
            "aabbccddeeff00112233445566778899"
        );
        assert!(normalize_commitment_hex("0xzz").is_err());
        assert!(normalize_commitment_hex("0xabcd").is_err()); // too short
        assert!(normalize_commitment_hex("").is_err());
    }

    #[test]
    fn etag_and_conditional() {
        let etag = etag_for_commitment("0xaabbccddeeff00112233445566778899").unwrap();
        assert_eq!(etag, "\"da-aabbccddeeff00112233445566778899\"");
        assert!(if_none_match_hits(Some(&etag), &etag));
        assert!(if_none_match_hits(Some("*"), &etag));
        assert!(!if_none_match_hits(Some("\"da-ffff\""), &etag));
        assert!(!if_none_match_hits(None, &etag));
    }

    #[test]
    fn full_object_when_no_header() {
        assert_eq!(parse_range_header(None, 100).unwrap(), None);
        assert_eq!(parse_range_header(Some(""), 100).unwrap(), None);
    }

    #[test]
    fn start_end_forms() {
        let r = parse_range_header(Some("bytes=0-4"), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end, r.size()), (0, 4, 5));
        assert_eq!(r.to_content_range(), "bytes 0-4/10");

        // Open-ended start.
        let r = parse_range_header(Some("bytes=6-"), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end), (6, 9));

        // End clamped to the object.
        let r = parse_range_header(Some("bytes=2-999"), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end), (2, 9));

        // Whitespace tolerated.
        let r = parse_range_header(Some(" bytes = 1 - 3 "), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end), (1, 3));
    }

    #[test]
    fn suffix_form() {
        let r = parse_range_header(Some("bytes=-4"), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end), (6, 9));
        // Suffix larger than the object means the whole object.
        let r = parse_range_header(Some("bytes=-99"), 10).unwrap().unwrap();
        assert_eq!((r.start, r.end), (0, 9));
    }

    #[test]
    fn rejected_forms() {
        for bad in [
            "bytes=0-4,6-8",
            "chars=0-4",
            "bytes=10-",
            "bytes=4-2",
            "bytes=-0",
            "bytes=x-y",
            "bytes=5",
        ] {
            assert!(parse_range_header(Some(bad), 10).is_err(), "{bad}");
        }
        assert!(parse_range_header(Some("bytes=-1"), 0).is_err());
    }
}
