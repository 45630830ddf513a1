use std::convert::Infallible;
use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    Internal,

    /// The user provided invalid input (configuration, expiration keyword,
    /// passphrase, share link) or performed an action that cannot succeed.
    User,

    /// The Yopass service was unreachable, answered with a non-success
    /// status, or answered with something that is not a Yopass response.
    Remote,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The base URL does not look like an http(s) URL.
    InvalidBaseUrl,
    /// The timeout value is negative, non-finite or unparsable.
    InvalidTimeout,
    /// The expiration keyword is not one of `1h`, `1d`, `1w`.
    InvalidExpiration,
    /// A share link could not be taken apart into identifier and passphrase.
    InvalidSecretUrl,
    /// The envelope is not an armored OpenPGP message, or carries no literal data.
    ArmoringInvalid,
    /// Decryption failed due to an incorrect passphrase or tampering
    /// or corruption.
    AuthenticationFailed,
    /// OpenPGP encryption failed.
    CipherFailure,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// The request never completed (connection refused, DNS, timeout).
    Transport,
    /// The service answered with a non-2xx status.
    HttpStatus,
    /// The response body was not the JSON the service is expected to send.
    ResponseFormat,
    /// Text that must be UTF-8 was not.
    Encoding,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct YopassError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl YopassError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// The message followed by the messages of every source, `: `-separated.
    pub fn chain(&self) -> String {
        let mut out = self.msg.clone();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            out.push_str(": ");
            out.push_str(&err.to_string());
            next = err.source();
        }
        out
    }

    /// True for errors raised by the client configuration setters.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.kind,
            Some(ErrorKind::InvalidBaseUrl) | Some(ErrorKind::InvalidTimeout)
        )
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

impl From<Infallible> for YopassError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, YopassError>;
