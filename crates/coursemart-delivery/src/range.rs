//! `Range` header resolution.
//!
//! Spans are inclusive on both ends, as on the wire: `bytes=0-0` is one byte.
//!
//! Accepted forms, for a resource of `L` bytes:
//!
//! | Header           | Span                    |
//! |------------------|-------------------------|
//! | `bytes=a-b`      | `a..=min(b, L-1)`       |
//! | `bytes=a-`       | `a..=L-1`               |
//! | `bytes=a`        | `a..=L-1`               |
//! | `bytes=-n`       | last `min(n, L)` bytes  |
//!
//! Anything else, including multiple ranges, other units, `a > b`, `a >= L`
//! and any range on an empty resource, is not satisfiable. There is no
//! fallback to the full body.

use coursemart_core::DeliveryError;

/// An inclusive byte span `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

// A span always covers at least one byte.
#[allow(clippy::len_without_is_empty)]
impl ByteSpan {
    /// The whole resource, or `None` when it is empty.
    pub fn full(total_length: u64) -> Option<Self> {
        total_length.checked_sub(1).map(|end| Self { start: 0, end })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for this span.
    pub fn content_range(&self, total_length: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_length)
    }
}

/// Resolve an optional `Range` header against a resource of `total_length`
/// bytes.
///
/// `Ok(None)` means no range was asked for and the full body should be sent.
pub fn resolve_range(
    header: Option<&str>,
    total_length: u64,
) -> Result<Option<ByteSpan>, DeliveryError> {
    let Some(header) = header else {
        return Ok(None);
    };

    parse_span(header.trim(), total_length)
        .map(Some)
        .ok_or(DeliveryError::RangeNotSatisfiable { total_length })
}

fn parse_span(header: &str, total_length: u64) -> Option<ByteSpan> {
    let (unit, spec) = header.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") || spec.contains(',') {
        return None;
    }
    let last = total_length.checked_sub(1)?;

    let (start, end) = match spec.split_once('-') {
        None => (parse_offset(spec)?, last),
        Some((first, "")) => (parse_offset(first)?, last),
        Some((first, suffix)) if first.trim().is_empty() => {
            let wanted = parse_offset(suffix)?;
            if wanted == 0 {
                return None;
            }
            (total_length.saturating_sub(wanted), last)
        }
        Some((first, second)) => {
            let start = parse_offset(first)?;
            let end = parse_offset(second)?;
            if start > end {
                return None;
            }
            (start, end.min(last))
        }
    };

    (start <= end).then_some(ByteSpan { start, end })
}

fn parse_offset(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: u64 = 1_000_000;

    fn span(header: &str) -> Option<ByteSpan> {
        resolve_range(Some(header), L).unwrap()
    }

    fn unsatisfiable(header: &str, total: u64) -> bool {
        matches!(
            resolve_range(Some(header), total),
            Err(DeliveryError::RangeNotSatisfiable { total_length }) if total_length == total
        )
    }

    #[test]
    fn test_no_header_means_full_body() {
        assert_eq!(resolve_range(None, L).unwrap(), None);
        assert_eq!(resolve_range(None, 0).unwrap(), None);
    }

    #[test]
    fn test_closed_range() {
        let s = span("bytes=500000-599999").unwrap();
        assert_eq!(s, ByteSpan { start: 500_000, end: 599_999 });
        assert_eq!(s.len(), 100_000);
        assert_eq!(s.content_range(L), "bytes 500000-599999/1000000");
    }

    #[test]
    fn test_single_byte_ranges() {
        assert_eq!(span("bytes=0-0").unwrap().len(), 1);
        assert_eq!(
            span("bytes=999999-999999").unwrap(),
            ByteSpan { start: 999_999, end: 999_999 }
        );
    }

    #[test]
    fn test_open_ended_and_bare_start() {
        let expected = ByteSpan { start: 999_000, end: 999_999 };
        assert_eq!(span("bytes=999000-").unwrap(), expected);
        assert_eq!(span("bytes=999000").unwrap(), expected);
        assert_eq!(expected.len(), 1_000);
    }

    #[test]
    fn test_end_past_length_is_clamped() {
        assert_eq!(
            span("bytes=999990-2000000").unwrap(),
            ByteSpan { start: 999_990, end: 999_999 }
        );
    }

    #[test]
    fn test_full_range_equals_whole_resource() {
        assert_eq!(span("bytes=0-999999"), ByteSpan::full(L));
    }

    #[test]
    fn test_suffix_ranges() {
        assert_eq!(
            span("bytes=-500").unwrap(),
            ByteSpan { start: 999_500, end: 999_999 }
        );
        assert_eq!(span("bytes=-5000000"), ByteSpan::full(L));
        assert!(unsatisfiable("bytes=-0", L));
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        assert!(unsatisfiable("bytes=999999-500", L));
        assert!(unsatisfiable("bytes=1000000-", L));
        assert!(unsatisfiable("bytes=2000000-3000000", L));
        assert!(unsatisfiable("bytes=0-10,20-30", L));
        assert!(unsatisfiable("items=0-10", L));
        assert!(unsatisfiable("bytes=abc-def", L));
        assert!(unsatisfiable("bytes=+5-10", L));
        assert!(unsatisfiable("bytes=", L));
        assert!(unsatisfiable("garbage", L));
    }

    #[test]
    fn test_any_range_on_empty_resource_is_unsatisfiable() {
        assert!(unsatisfiable("bytes=0-", 0));
        assert!(unsatisfiable("bytes=-1", 0));
        assert_eq!(ByteSpan::full(0), None);
    }

    #[test]
    fn test_whitespace_and_unit_case_tolerated() {
        assert_eq!(
            resolve_range(Some(" Bytes=0-9 "), L).unwrap(),
            Some(ByteSpan { start: 0, end: 9 })
        );
    }

    #[test]
    fn test_span_length_is_inclusive() {
        assert_eq!(ByteSpan { start: 7, end: 7 }.len(), 1);
        assert_eq!(ByteSpan { start: 0, end: 9 }.len(), 10);
        assert_eq!(ByteSpan::full(L).map(|s| s.len()), Some(L));
    }
}
