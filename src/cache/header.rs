/// Extracts the expiration instant embedded at the start of a cache file.
///
/// The engine reads at most `header_len()` bytes and hands them over;
/// `None` means the file is not a cache entry this reader understands.
pub trait ExpirationReader {
    fn header_len(&self) -> usize;

    /// Expiration as epoch seconds
    fn parse_expiration(&self, header: &[u8]) -> Option<i64>;
}

/// Leading 10-byte numeric epoch, e.g. `1554148303s:5:"value";`
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadingTimestamp;

impl LeadingTimestamp {
    pub const LEN: usize = 10;
}

impl ExpirationReader for LeadingTimestamp {
    fn header_len(&self) -> usize {
        Self::LEN
    }

    fn parse_expiration(&self, header: &[u8]) -> Option<i64> {
        let text = std::str::from_utf8(header).ok()?.trim_matches(|c: char| c.is_ascii_whitespace());
        // A bare zero header carries no expiration
        if text.is_empty() || text == "0" {
            return None;
        }

        if let Ok(whole) = text.parse::<i64>() {
            return Some(whole);
        }

        // Decimal and exponent forms are truncated
        let numeric = text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
        if !numeric || !text.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(header: &str) -> Option<i64> {
        LeadingTimestamp.parse_expiration(header.as_bytes())
    }

    #[test]
    fn test_plain_timestamp() {
        assert_eq!(parse("1554148303"), Some(1554148303));
        assert_eq!(parse("9999999999"), Some(9999999999));
    }

    #[test]
    fn test_numeric_variants() {
        assert_eq!(parse("  12345   "), Some(12345));
        assert_eq!(parse("+42"), Some(42));
        assert_eq!(parse("12.75"), Some(12));
        assert_eq!(parse("1e5"), Some(100000));
        assert_eq!(parse("1.5E3"), Some(1500));
        assert_eq!(parse("0000000000"), Some(0));
    }

    #[test]
    fn test_bare_zero_is_not_an_expiration() {
        assert_eq!(parse("0"), None);
        assert_eq!(parse("0         "), None);
    }

    #[test]
    fn test_non_numeric_headers() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("s:5:\"val\";"), None);
        assert_eq!(parse("12ab"), None);
        assert_eq!(parse("inf"), None);
        assert_eq!(parse("e5"), None);
        assert_eq!(parse("1e"), None);
        assert_eq!(LeadingTimestamp.parse_expiration(&[0xff, 0xfe]), None);
    }
}
