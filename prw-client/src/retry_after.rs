use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;

/// The HTTP date format of `Retry-After`, for example `Wed, 21 Oct 2015 07:28:00 GMT`.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parses the value of a `Retry-After` header.
///
/// The value is either an HTTP date or a number of seconds. Values that cannot be parsed and dates
/// in the past yield a zero duration, as if the header was absent.
pub fn retry_after_duration(value: &str) -> Duration {
    retry_after_at(value, SystemTime::now())
}

fn retry_after_at(value: &str, now: SystemTime) -> Duration {
    let value = value.trim();

    if let Ok(date) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        let at = SystemTime::from(date.and_utc());
        return at.duration_since(now).unwrap_or_default();
    }

    value
        .parse()
        .map(Duration::from_secs)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds() {
        assert_eq!(retry_after_duration("120"), Duration::from_secs(120));
        assert_eq!(retry_after_duration("0"), Duration::ZERO);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(retry_after_duration(""), Duration::ZERO);
        assert_eq!(retry_after_duration("-5"), Duration::ZERO);
        assert_eq!(retry_after_duration("soon"), Duration::ZERO);
        assert_eq!(retry_after_duration("2015-10-21T07:28:00Z"), Duration::ZERO);
    }

    #[test]
    fn test_http_date() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_445_412_400);
        assert_eq!(
            retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Duration::from_secs(80)
        );
    }

    #[test]
    fn test_http_date_in_past() {
        assert_eq!(
            retry_after_duration("Wed, 21 Oct 2015 07:28:00 GMT"),
            Duration::ZERO
        );
    }
}
