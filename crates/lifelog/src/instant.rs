//! ISO-8601 instants as they travel through the text store and the REST wire.
//!
//! Instants are written as millisecond-precision UTC (`2024-01-15T10:30:00.000Z`).
//! On read, any string matching the lexical ISO-8601 shape is accepted: with
//! or without fractional seconds, `Z` or a signed `±HH:MM` offset. A string
//! that has the right shape but names an impossible instant is rejected with
//! `None`, never a panic.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current time, truncated to the millisecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render an instant in its canonical stored form.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored instant.
///
/// Returns `None` when the text is not ISO-8601 shaped or does not name a
/// valid instant.
///
/// ```
/// use lifelog::instant::parse_instant;
///
/// assert!(parse_instant("2024-01-15T10:30:00.000Z").is_some());
/// assert!(parse_instant("2024-01-15T10:30:00Z").is_some());
/// assert!(parse_instant("2024-01-15T19:30:00+09:00").is_some());
/// assert!(parse_instant("2024-13-15T10:30:00Z").is_none());
/// assert!(parse_instant("Buy milk").is_none());
/// ```
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if !looks_like_instant(text) {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Lexical check only: `YYYY-MM-DDTHH:mm:ss[.f+](Z|±HH:MM)`.
pub fn looks_like_instant(text: &str) -> bool {
    let b = text.as_bytes();
    if b.len() < 20 {
        return false;
    }
    let digits = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);
    let date_time = digits(0..4)
        && b[4] == b'-'
        && digits(5..7)
        && b[7] == b'-'
        && digits(8..10)
        && b[10] == b'T'
        && digits(11..13)
        && b[13] == b':'
        && digits(14..16)
        && b[16] == b':'
        && digits(17..19);
    if !date_time {
        return false;
    }

    let mut rest = &b[19..];
    if let Some((&b'.', frac)) = rest.split_first() {
        let n = frac.iter().take_while(|c| c.is_ascii_digit()).count();
        if n == 0 {
            return false;
        }
        rest = &frac[n..];
    }

    match rest {
        [b'Z'] => true,
        [sign, h1, h2, b':', m1, m2] if *sign == b'+' || *sign == b'-' => {
            [h1, h2, m1, m2].iter().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

/// Serde adapter for `DateTime<Utc>` fields.
///
/// Use as `#[serde(with = "lifelog::instant::iso8601")]`.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_instant, parse_instant};

    /// Serialize as canonical millisecond UTC text.
    pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_instant(instant))
    }

    /// Deserialize from any accepted ISO-8601 shape.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_instant(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 instant: {raw:?}")))
    }

    /// Same adapter for optional (nullable) instant fields.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        use super::super::{format_instant, parse_instant};

        /// Serialize `Some` as text and `None` as null.
        pub fn serialize<S: Serializer>(
            instant: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match instant {
                Some(instant) => s.serialize_some(&format_instant(instant)),
                None => s.serialize_none(),
            }
        }

        /// Accept null, or any accepted ISO-8601 shape.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse_instant(&raw).map(Some).ok_or_else(|| {
                    de::Error::custom(format!("invalid ISO-8601 instant: {raw:?}"))
                }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_full_precision_utc() {
        let dt = parse_instant("2024-01-15T10:30:00.123Z").unwrap();
        assert_eq!(dt.timestamp_millis() % 1000, 123);
    }

    #[test]
    fn accepts_utc_without_millis() {
        let dt = parse_instant("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn accepts_signed_offsets() {
        let east = parse_instant("2024-01-15T19:30:00+09:00").unwrap();
        let west = parse_instant("2024-01-15T05:30:00.000-05:00").unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(east, utc);
        assert_eq!(west, utc);
    }

    #[test]
    fn lexical_match_with_invalid_instant_is_none() {
        assert!(looks_like_instant("2024-02-30T10:30:00Z"));
        assert_eq!(parse_instant("2024-02-30T10:30:00Z"), None);
        assert_eq!(parse_instant("2024-01-15T25:00:00Z"), None);
    }

    #[test]
    fn rejects_non_iso_text() {
        for text in [
            "",
            "2024-01-15",
            "2024-01-15 10:30:00Z",
            "2024-01-15T10:30:00",
            "2024-01-15T10:30:00.Z",
            "2024-01-15T10:30:00+0900",
            "Buy milk at 2024-01-15T10:30:00Z",
        ] {
            assert!(!looks_like_instant(text), "{text:?} should not match");
        }
    }

    #[test]
    fn format_is_millisecond_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_instant(&dt), "2024-01-15T10:30:00.000Z");
        assert_eq!(parse_instant(&format_instant(&dt)), Some(dt));
    }

    #[test]
    fn now_has_millisecond_precision() {
        let t = now();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(parse_instant(&format_instant(&t)), Some(t));
    }
}
