use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parse a Retry-After header value into a delay in seconds.
///
/// Accepted forms, tried in order: delta-seconds (a non-negative decimal
/// integer), an RFC 3339 datetime, an RFC 1123 HTTP-date, and the obsolete
/// RFC 850 form. Absolute datetimes in the past yield 0. Anything else is
/// `None` and the header is treated as absent.
pub fn parse(value: &str) -> Option<u64> {
    parse_at(value, Utc::now())
}

fn parse_at(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Delta-seconds is 1*DIGIT; a leading sign or a fraction is not valid.
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok();
    }

    let when = DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_rfc850(value))?;

    Some((when - now).num_seconds().max(0) as u64)
}

fn parse_rfc850(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%A, %d-%b-%y %H:%M:%S GMT")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn delta_seconds() {
        assert_eq!(parse_at("120", now()), Some(120));
        assert_eq!(parse_at(" 300 ", now()), Some(300));
        assert_eq!(parse_at("0", now()), Some(0));
    }

    #[test]
    fn rejects_signed_and_fractional() {
        assert_eq!(parse_at("-30", now()), None);
        assert_eq!(parse_at("+30", now()), None);
        assert_eq!(parse_at("60.5", now()), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_at("", now()), None);
        assert_eq!(parse_at("   ", now()), None);
        assert_eq!(parse_at("soon", now()), None);
    }

    #[test]
    fn rfc3339_future() {
        assert_eq!(parse_at("2024-03-01T12:04:00Z", now()), Some(240));
        assert_eq!(parse_at("2024-03-01T13:04:00+01:00", now()), Some(240));
    }

    #[test]
    fn rfc1123_future() {
        assert_eq!(parse_at("Fri, 01 Mar 2024 12:04:00 GMT", now()), Some(240));
    }

    #[test]
    fn rfc850_future() {
        assert_eq!(parse_at("Friday, 01-Mar-24 12:04:00 GMT", now()), Some(240));
    }

    #[test]
    fn past_dates_clamp_to_zero() {
        assert_eq!(parse_at("2024-03-01T11:00:00Z", now()), Some(0));
        assert_eq!(parse_at("Thu, 29 Feb 2024 12:00:00 GMT", now()), Some(0));
    }

    #[test]
    fn live_clock_never_panics() {
        for input in ["120", "2038-01-19T03:14:07Z", "nonsense", ""] {
            let _ = parse(input);
        }
    }
}
