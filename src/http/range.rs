//! HTTP Range request parsing module
//!
//! Single `bytes` range parsing (RFC 7233). Multi-range requests are served in full.

/// Resolved byte range, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes covered by the range
    pub const fn content_length(self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a body of `total` bytes
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Satisfiable range, clamped to the body
    Valid(ByteRange),
    /// Range outside the body - should return 416
    NotSatisfiable,
    /// No Range header or unsupported form (ignore, return full content)
    None,
}

/// Parse an HTTP `Range` header against a body of `size` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use pipeline_demo::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 0, end: 99 }));
///
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: usize) -> RangeParseResult {
    let Some(ranges) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    if ranges.contains(',') {
        return RangeParseResult::None;
    }

    let Some((first, last)) = ranges.split_once('-') else {
        return RangeParseResult::None;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // "-500": the final 500 bytes
        let Ok(suffix) = last.parse::<usize>() else {
            return RangeParseResult::None;
        };
        if suffix == 0 || size == 0 {
            return RangeParseResult::NotSatisfiable;
        }
        return RangeParseResult::Valid(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) => end.min(size - 1),
            Err(_) => return RangeParseResult::None,
        }
    };

    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
