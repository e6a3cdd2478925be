/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Parse an RFC 3339 timestamp into UTC milliseconds
pub fn parse_rfc3339_millis(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_millis() {
        assert_eq!(
            parse_rfc3339_millis("2024-01-01T12:00:00Z"),
            Some(1_704_110_400_000)
        );
        assert_eq!(
            parse_rfc3339_millis("2024-01-01T13:00:00+01:00"),
            Some(1_704_110_400_000)
        );
        assert_eq!(parse_rfc3339_millis("yesterday"), None);
    }
}
