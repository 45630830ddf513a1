//! yopass-client - share secrets through a Yopass service
//!
//! Messages are encrypted locally under a passphrase, only the armored
//! envelope is uploaded, and the passphrase travels in the fragment of the
//! share link.

#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod expiration;
pub mod file_ops;
pub mod passphrase;
pub mod share_url;

pub use client::Client;
pub use config::{DEFAULT_BASE_URL, Timeout};
pub use envelope::{EnvelopeCipher, OpenPgp};
pub use error::{ErrorCategory, ErrorKind, Result, YopassError};
pub use expiration::Expiration;
pub use passphrase::generate_passphrase;
pub use share_url::{SharedSecret, parse_secret_url, secret_url};
