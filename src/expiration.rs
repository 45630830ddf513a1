use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};

/// How long the service keeps a secret before discarding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiration {
    OneHour,
    OneDay,
    OneWeek,
}

impl Expiration {
    pub const ALL: [Expiration; 3] = [Expiration::OneHour, Expiration::OneDay, Expiration::OneWeek];

    /// Lifetime in seconds, as sent to the service.
    pub fn as_secs(self) -> u64 {
        match self {
            Expiration::OneHour => 3600,
            Expiration::OneDay => 86400,
            Expiration::OneWeek => 604800,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Expiration::OneHour => "1h",
            Expiration::OneDay => "1d",
            Expiration::OneWeek => "1w",
        }
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Expiration {
    type Err = YopassError;

    fn from_str(s: &str) -> Result<Self> {
        Expiration::ALL
            .into_iter()
            .find(|e| e.keyword() == s)
            .ok_or_else(|| {
                YopassError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::InvalidExpiration,
                    format!("invalid expiration {:?}: expected 1h, 1d or 1w", s),
                )
            })
    }
}
