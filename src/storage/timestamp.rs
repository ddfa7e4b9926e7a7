// Stored timestamps
//
// RFC 3339 on write. Reads also accept naive ISO-8601 timestamps (taken as
// UTC), which is what files written by the previous bot contain.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(parse("2024-05-01T09:30:00+00:00").unwrap(), expected);
        assert_eq!(parse("2024-05-01T11:30:00+02:00").unwrap(), expected);
        assert_eq!(parse("2024-05-01T09:30:00").unwrap(), expected);
        assert_eq!(
            parse("2024-05-01T09:30:00.123456").unwrap(),
            expected + chrono::Duration::microseconds(123456)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("2024-05-01").is_err());
    }
}
