use chrono::{DateTime, SecondsFormat, Utc};

// UTC, millisecond precision, `Z` suffix: 2024-05-01T03:00:00.123Z
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_z() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap() + chrono::Duration::milliseconds(123);
        assert_eq!(iso8601(ts), "2024-05-01T03:00:00.123Z");
    }

    #[test]
    fn whole_seconds_keep_zero_millis() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(iso8601(ts), "2023-12-31T23:59:59.000Z");
    }
}
