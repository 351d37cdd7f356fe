//! Single-range `Range` header parsing for partial downloads.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range; serve the whole file with 200.
    Full,
    /// Inclusive byte span within the file; serve 206.
    Segment { start: u64, end: u64 },
    /// Syntactically valid but outside the file; answer 416.
    Unsatisfiable,
}

/// Parse a `Range` header against a file of `size` bytes. Only the single
/// range form is supported; multi-range and malformed headers fall back to
/// serving the whole file, which RFC 7233 permits.
pub fn parse_range(header: Option<&str>, size: u64) -> ByteRange {
    let Some(value) = header else {
        return ByteRange::Full;
    };
    let Some(spec) = value.strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    if size == 0 {
        return ByteRange::Unsatisfiable;
    }

    let Some((start_s, end_s)) = spec.split_once('-') else {
        return ByteRange::Full;
    };

    match (start_s.is_empty(), end_s.is_empty()) {
        // bytes=-n : final n bytes
        (true, false) => match end_s.parse::<u64>() {
            Ok(0) | Err(_) => ByteRange::Unsatisfiable,
            Ok(n) => {
                let start = size.saturating_sub(n);
                ByteRange::Segment {
                    start,
                    end: size - 1,
                }
            }
        },
        // bytes=a- : from a to the end
        (false, true) => match start_s.parse::<u64>() {
            Ok(start) if start < size => ByteRange::Segment {
                start,
                end: size - 1,
            },
            Ok(_) => ByteRange::Unsatisfiable,
            Err(_) => ByteRange::Full,
        },
        // bytes=a-b
        (false, false) => match (start_s.parse::<u64>(), end_s.parse::<u64>()) {
            (Ok(start), Ok(end)) => {
                if start > end {
                    ByteRange::Full
                } else if start >= size {
                    ByteRange::Unsatisfiable
                } else {
                    ByteRange::Segment {
                        start,
                        end: end.min(size - 1),
                    }
                }
            }
            _ => ByteRange::Full,
        },
        (true, true) => ByteRange::Full,
    }
}
