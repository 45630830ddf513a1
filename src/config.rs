//! Validated client configuration values: the service base URL and the
//! request timeout.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};

/// Public Yopass instance used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.yopass.se";

/// Check that `value` is an http(s) URL whose host is a DNS name,
/// `localhost` or a dotted quad, with optional port and path/query.
///
/// Scheme and host compare case-insensitively.
pub fn validate_base_url(value: &str) -> Result<()> {
    if matches_url_grammar(value) {
        Ok(())
    } else {
        Err(YopassError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidBaseUrl,
            format!("invalid base URL {:?}: http(s) URL expected", value),
        ))
    }
}

fn matches_url_grammar(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let Some(rest) = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    else {
        return false;
    };

    let host_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        .unwrap_or(rest.len());
    let (host, rest) = rest.split_at(host_end);
    if !(host == "localhost" || is_dotted_quad(host) || is_domain_name(host)) {
        return false;
    }

    let rest = match rest.strip_prefix(':') {
        Some(port_and_rest) => {
            let port_end = port_and_rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(port_and_rest.len());
            if port_end == 0 {
                return false;
            }
            &port_and_rest[port_end..]
        }
        None => rest,
    };

    match rest.strip_prefix('/').or_else(|| rest.strip_prefix('?')) {
        _ if rest.is_empty() || rest == "/" => true,
        Some(tail) => !tail.is_empty() && !tail.chars().any(char::is_whitespace),
        None => false,
    }
}

fn is_dotted_quad(host: &str) -> bool {
    let groups: Vec<&str> = host.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()))
}

fn is_domain_name(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    let Some((labels, tld)) = host.rsplit_once('.') else {
        return false;
    };
    (2..=6).contains(&tld.len())
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && labels.split('.').all(is_dns_label)
}

fn is_dns_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= 63
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

/// How long a request to the service may take.
///
/// A zero single value means no timeout, so `0`, `0.0` and `Duration::ZERO`
/// all convert to [`Timeout::Unbounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Wait as long as the transport allows.
    #[default]
    Unbounded,
    /// One limit covering connect and the whole response.
    Total(Duration),
    /// Separate limits for establishing the connection and for the response.
    Split { connect: Duration, read: Duration },
}

impl Timeout {
    /// Limit on establishing the connection, if any.
    pub fn connect(&self) -> Option<Duration> {
        match *self {
            Timeout::Unbounded => None,
            Timeout::Total(total) => Some(total),
            Timeout::Split { connect, .. } => Some(connect),
        }
    }

    /// Limit on the request as a whole, if any.
    pub fn request(&self) -> Option<Duration> {
        match *self {
            Timeout::Unbounded => None,
            Timeout::Total(total) => Some(total),
            Timeout::Split { connect, read } => Some(connect.saturating_add(read)),
        }
    }
}

fn invalid_timeout(msg: impl Into<String>) -> YopassError {
    YopassError::with_kind(ErrorCategory::User, ErrorKind::InvalidTimeout, msg)
}

fn seconds(value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid_timeout(format!(
            "invalid timeout {}: non-negative number of seconds expected",
            value
        )));
    }
    Duration::try_from_secs_f64(value).map_err(|e| {
        YopassError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidTimeout,
            format!("invalid timeout {}", value),
            e,
        )
    })
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        if value.is_zero() {
            Timeout::Unbounded
        } else {
            Timeout::Total(value)
        }
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(value: Option<Duration>) -> Self {
        value.map(Timeout::from).unwrap_or_default()
    }
}

impl From<u64> for Timeout {
    fn from(secs: u64) -> Self {
        Timeout::from(Duration::from_secs(secs))
    }
}

impl TryFrom<f64> for Timeout {
    type Error = YopassError;

    fn try_from(secs: f64) -> Result<Self> {
        Ok(Timeout::from(seconds(secs)?))
    }
}

impl TryFrom<(Duration, Duration)> for Timeout {
    type Error = YopassError;

    fn try_from((connect, read): (Duration, Duration)) -> Result<Self> {
        if connect.is_zero() || read.is_zero() {
            return Err(invalid_timeout(
                "invalid timeout pair: both connect and read must be positive",
            ));
        }
        Ok(Timeout::Split { connect, read })
    }
}

impl TryFrom<(f64, f64)> for Timeout {
    type Error = YopassError;

    fn try_from((connect, read): (f64, f64)) -> Result<Self> {
        Timeout::try_from((seconds(connect)?, seconds(read)?))
    }
}

impl FromStr for Timeout {
    type Err = YopassError;

    /// Accepts `""`/`none`, a number of seconds (`"3"`, `"2.5"`) or a
    /// connect,read pair (`"3,10"`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Timeout::Unbounded);
        }

        let parse = |part: &str| -> Result<f64> {
            part.trim().parse::<f64>().map_err(|e| {
                YopassError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::InvalidTimeout,
                    format!("invalid timeout {:?}: seconds or connect,read pair expected", s),
                    e,
                )
            })
        };

        match s.split_once(',') {
            Some((connect, read)) => Timeout::try_from((parse(connect)?, parse(read)?)),
            None => Timeout::try_from(parse(s)?),
        }
    }
}

impl TryFrom<&str> for Timeout {
    type Error = YopassError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}
