//! Passphrase generation and reading

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Length of passphrases generated when the caller does not ask for one.
pub const DEFAULT_PASSPHRASE_LENGTH: usize = 22;

/// Generate `length` characters drawn uniformly from `A-Z`, `a-z` and `0-9`.
///
/// Randomness comes from the operating system's CSPRNG.
pub fn generate_passphrase(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase.
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads passphrase from any io::Read source
///
/// Everything up to end of input is the passphrase; a single trailing
/// newline (as left by `echo`) is dropped.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;

        let mut end = data.len();
        if data[..end].ends_with(b"\n") {
            end -= 1;
            if data[..end].ends_with(b"\r") {
                end -= 1;
            }
        }

        let text = std::str::from_utf8(&data[..end]).map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Encoding,
                "passphrase is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(YopassError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        io::stderr()
            .write_all(b"Passphrase (yopass): ")
            .and_then(|()| io::stderr().flush())
            .map_err(|e| {
                YopassError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read password *without echo*
        let passphrase = rpassword::read_password().map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase))
    }
}
