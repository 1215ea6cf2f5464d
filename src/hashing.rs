//! Content hashing and timestamp parsing.

use chrono::DateTime;
use sha2::{Digest, Sha256};

/// First 16 hex characters of the SHA-256 digest of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}

/// Parse an ISO-8601 timestamp string into epoch milliseconds, or
/// `None` if it doesn't parse.
pub fn parse_timestamp_ms(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Epoch milliseconds for a date string (`YYYY-MM-DD`) at midnight UTC.
pub fn date_start_ms(date: &str) -> Option<i64> {
    parse_timestamp_ms(&format!("{date}T00:00:00Z"))
}

/// Epoch milliseconds for a date string at the last instant of that day
/// (used for `endDate` bounds).
pub fn date_end_ms(date: &str) -> Option<i64> {
    parse_timestamp_ms(&format!("{date}T23:59:59.999Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_16_hex_chars() {
        let h = content_hash("Short issue");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash("same text"), content_hash("same text"));
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn parse_timestamp_ms_known_value() {
        assert_eq!(parse_timestamp_ms("2024-01-15T10:00:00Z"), Some(1705312800000));
    }

    #[test]
    fn parse_timestamp_ms_rejects_garbage() {
        assert_eq!(parse_timestamp_ms("not a date"), None);
    }

    #[test]
    fn date_bounds_match_spec_example() {
        assert_eq!(date_start_ms("2024-01-01"), Some(1704067200000));
    }
}
