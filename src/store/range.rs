//! `Range` request header handling.
//!
//! Only single `bytes=` ranges are understood. Anything else is treated as
//! absent, the same way S3 ignores a malformed `Range` header.

use std::fmt;

/// A single byte range requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-end`, end inclusive.
    Bounded { start: u64, end: u64 },
    /// `bytes=start-`
    From(u64),
    /// `bytes=-n`
    Suffix(u64),
}

impl ByteRange {
    /// Parse a `Range` header value.
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());
        match (start.is_empty(), end.is_empty()) {
            (true, false) => end.parse().ok().map(ByteRange::Suffix),
            (false, true) => start.parse().ok().map(ByteRange::From),
            (false, false) => {
                let start: u64 = start.parse().ok()?;
                let end: u64 = end.parse().ok()?;
                (start <= end).then_some(ByteRange::Bounded { start, end })
            }
            (true, true) => None,
        }
    }

    /// Resolve against an object of `size` bytes into a half-open range.
    ///
    /// Returns `None` when the range is unsatisfiable.
    pub fn resolve(&self, size: u64) -> Option<std::ops::Range<u64>> {
        match *self {
            ByteRange::Bounded { start, end } if start < size => Some(start..end.saturating_add(1).min(size)),
            ByteRange::From(start) if start < size => Some(start..size),
            ByteRange::Suffix(n) if n > 0 && size > 0 => Some(size.saturating_sub(n)..size),
            _ => None,
        }
    }

    /// `Content-Range` value for a resolved range.
    pub fn content_range(resolved: &std::ops::Range<u64>, size: u64) -> String {
        format!("bytes {}-{}/{}", resolved.start, resolved.end.saturating_sub(1), size)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteRange::Bounded { start, end } => write!(f, "bytes={}-{}", start, end),
            ByteRange::From(start) => write!(f, "bytes={}-", start),
            ByteRange::Suffix(n) => write!(f, "bytes=-{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(ByteRange::parse("bytes=0-99"), Some(ByteRange::Bounded { start: 0, end: 99 }));
        assert_eq!(ByteRange::parse("bytes=100-"), Some(ByteRange::From(100)));
        assert_eq!(ByteRange::parse("bytes=-5"), Some(ByteRange::Suffix(5)));
        assert_eq!(ByteRange::parse("bytes=5-1"), None);
        assert_eq!(ByteRange::parse("bytes=0-1,4-5"), None);
        assert_eq!(ByteRange::parse("items=0-1"), None);
    }

    #[test]
    fn test_resolve_clamps_to_size() {
        let range = ByteRange::Bounded { start: 2, end: 1000 };
        assert_eq!(range.resolve(10), Some(2..10));
        assert_eq!(ByteRange::Suffix(4).resolve(10), Some(6..10));
        assert_eq!(ByteRange::From(10).resolve(10), None);
        assert_eq!(ByteRange::content_range(&(2..10), 10), "bytes 2-9/10");
    }

    #[test]
    fn test_resolve_end_at_u64_max() {
        let range = ByteRange::parse("bytes=0-18446744073709551615").unwrap();
        assert_eq!(range, ByteRange::Bounded { start: 0, end: u64::MAX });
        assert_eq!(range.resolve(10), Some(0..10));
        assert_eq!(ByteRange::content_range(&(0..10), 10), "bytes 0-9/10");
    }
}
