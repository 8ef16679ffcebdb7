use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use tracing::warn;

pub const REMAINING: &str = "x-ratelimit-remaining";
pub const RESET: &str = "x-ratelimit-reset";
pub const GLOBAL: &str = "x-ratelimit-global";
pub const RETRY_AFTER: &str = "retry-after";

/// Rate limit information reported by a response. Every field is optional, a header that is
/// missing or can't be parsed simply carries no information.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateLimitInfo {
    pub remaining: Option<i64>,
    /// Time from now until the bucket resets
    pub reset_after: Option<Duration>,
    pub global: bool,
    pub retry_after: Option<Duration>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_headers_at(headers, SystemTime::now())
    }

    pub fn from_headers_at(headers: &HeaderMap, now: SystemTime) -> Self {
        let remaining = header_str(headers, REMAINING).and_then(|value| parse_or_warn::<i64>(REMAINING, value));

        let reset_after = header_str(headers, RESET)
            .and_then(|value| parse_or_warn::<f64>(RESET, value))
            .and_then(|epoch| reset_delay(epoch, now));

        let retry_after = header_str(headers, RETRY_AFTER)
            .and_then(|value| parse_or_warn::<f64>(RETRY_AFTER, value))
            .and_then(millis_to_duration);

        RateLimitInfo {
            remaining,
            reset_after,
            global: headers.contains_key(GLOBAL),
            retry_after,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_none() && self.reset_after.is_none() && !self.global && self.retry_after.is_none()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(value) => Some(value.trim()),
        Err(_) => {
            warn!("Rate limit header {} is not valid ascii, ignoring it", name);
            None
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(name: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Failed to parse rate limit header {}: {:?}", name, value);
            None
        }
    }
}

// resets in the past mean the bucket is already usable again
fn reset_delay(epoch_seconds: f64, now: SystemTime) -> Option<Duration> {
    if !epoch_seconds.is_finite() || epoch_seconds < 0.0 {
        warn!("Received a nonsensical rate limit reset: {}", epoch_seconds);
        return None;
    }
    let reset = UNIX_EPOCH + Duration::from_secs_f64(epoch_seconds);
    Some(reset.duration_since(now).unwrap_or_default())
}

fn millis_to_duration(millis: f64) -> Option<Duration> {
    if !millis.is_finite() || millis < 0.0 {
        warn!("Received a nonsensical retry after: {}", millis);
        return None;
    }
    Some(Duration::from_secs_f64(millis / 1000.0))
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderName, HeaderValue};

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn parses_bucket_headers() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        let info = RateLimitInfo::from_headers_at(
            &headers(&[("X-RateLimit-Remaining", "4"), ("X-RateLimit-Reset", "1002.5")]),
            now,
        );
        assert_eq!(info.remaining, Some(4));
        assert_eq!(info.reset_after, Some(Duration::from_millis(2_500)));
        assert!(!info.global);
        assert_eq!(info.retry_after, None);
    }

    #[test]
    fn parses_global_headers() {
        let info = RateLimitInfo::from_headers(&headers(&[("X-RateLimit-Global", "true"), ("Retry-After", "1500")]));
        assert!(info.global);
        assert_eq!(info.retry_after, Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn garbage_degrades_to_no_information() {
        let info = RateLimitInfo::from_headers(&headers(&[
            ("X-RateLimit-Remaining", "lots"),
            ("X-RateLimit-Reset", "soon"),
            ("Retry-After", "-5"),
        ]));
        assert!(info.is_empty());
    }

    #[test]
    fn reset_in_the_past_is_immediate() {
        let now = UNIX_EPOCH + Duration::from_secs(5_000);
        let info = RateLimitInfo::from_headers_at(&headers(&[("X-RateLimit-Reset", "4000")]), now);
        assert_eq!(info.reset_after, Some(Duration::ZERO));
    }
}
