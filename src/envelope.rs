//! The encryption provider used by [`crate::client::Client`].
//!
//! An envelope is the armored text stored by the service. The client treats
//! it as opaque: it only ever seals plaintext into one or opens one back up.

use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::StringToKey;
use pgp::{Deserializable, Message};
use rand::rngs::OsRng;

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};

/// First line of every armored OpenPGP message.
pub const PGP_MESSAGE_HEADER: &str = "-----BEGIN PGP MESSAGE-----";

/// Seals plaintext into an armored envelope under a passphrase, and back.
pub trait EnvelopeCipher {
    /// Encrypt `plaintext` under `passphrase`, returning the armored envelope.
    fn seal(&self, plaintext: &str, passphrase: &str) -> Result<String>;

    /// Recover the plaintext of `envelope`.
    ///
    /// Fails for a wrong passphrase, a malformed or empty envelope, and for
    /// plaintext that is not UTF-8.
    fn open(&self, envelope: &str, passphrase: &str) -> Result<String>;
}

/// Password-encrypted OpenPGP message (SKESK + SEIPD, AES-256), ASCII
/// armored. This is what the Yopass server accepts and its web UI opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenPgp;

fn decrypt_error(msg: impl std::fmt::Display) -> YopassError {
    YopassError::with_kind(
        ErrorCategory::User,
        ErrorKind::AuthenticationFailed,
        format!(
            "failed to decrypt: corrupt input, tampered-with data, or bad passphrase ({})",
            msg
        ),
    )
}

fn armor_error(msg: impl std::fmt::Display) -> YopassError {
    YopassError::with_kind(
        ErrorCategory::User,
        ErrorKind::ArmoringInvalid,
        format!("envelope is not an armored OpenPGP message: {}", msg),
    )
}

impl EnvelopeCipher for OpenPgp {
    fn seal(&self, plaintext: &str, passphrase: &str) -> Result<String> {
        let mut rng = OsRng;
        let literal = Message::new_literal("", plaintext);
        let s2k = StringToKey::new_default(&mut rng);
        let password = passphrase.to_string();

        let encrypted = literal
            .encrypt_with_password_seipdv1(&mut rng, s2k, SymmetricKeyAlgorithm::AES256, || {
                password
            })
            .and_then(|message| message.to_armored_string(Default::default()))
            .map_err(|e| {
                YopassError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::CipherFailure,
                    format!("OpenPGP encryption failed: {}", e),
                )
            })?;
        Ok(encrypted)
    }

    fn open(&self, envelope: &str, passphrase: &str) -> Result<String> {
        let envelope = envelope.trim();
        if !envelope.starts_with(PGP_MESSAGE_HEADER) {
            return Err(armor_error("missing PGP MESSAGE header"));
        }
        let (message, _headers) =
            Message::from_armor_single(envelope.as_bytes()).map_err(armor_error)?;

        let password = passphrase.to_string();
        let decrypted = message
            .decrypt_with_password(|| password)
            .map_err(decrypt_error)?;
        let content = decrypted
            .get_content()
            .map_err(decrypt_error)?
            .ok_or_else(|| armor_error("message carries no literal data"))?;

        String::from_utf8(content).map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Encoding,
                "decrypted secret is not valid UTF-8",
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_produces_armored_pgp() {
        let envelope = OpenPgp.seal("message", "password").unwrap();
        assert!(envelope.starts_with(PGP_MESSAGE_HEADER));
        assert!(envelope.trim_end().ends_with("-----END PGP MESSAGE-----"));
        assert_eq!(OpenPgp.open(&envelope, "password").unwrap(), "message");
    }

    #[test]
    fn test_unicode_and_empty_message() {
        let envelope = OpenPgp.seal("", "pw").unwrap();
        assert_eq!(OpenPgp.open(&envelope, "pw").unwrap(), "");

        let text = "grüße, 秘密 🔑\nline two";
        let envelope = OpenPgp.seal(text, "pw").unwrap();
        assert_eq!(OpenPgp.open(&envelope, "pw").unwrap(), text);
    }

    #[test]
    fn test_each_seal_is_fresh() {
        let first = OpenPgp.seal("message", "password").unwrap();
        let second = OpenPgp.seal("message", "password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_passphrase() {
        let envelope = OpenPgp.seal("message", "password").unwrap();
        let err = OpenPgp
            .open(&envelope, "wrong_password")
            .expect_err("expected authentication failure");

        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(err.message().contains("bad passphrase"));
    }

    #[test]
    fn test_empty_and_foreign_envelopes() {
        for envelope in ["", "yopass1:dGVzdA", "-----BEGIN PGP MESSAGE-----\n\nnot base64\n"] {
            let err = OpenPgp
                .open(envelope, "password")
                .expect_err("expected armor error");
            assert_eq!(err.kind, Some(ErrorKind::ArmoringInvalid), "{:?}", envelope);
        }
    }

    #[test]
    fn test_non_utf8_plaintext() {
        let mut rng = OsRng;
        let s2k = StringToKey::new_default(&mut rng);
        let envelope = Message::new_literal_bytes("", &[0xff, 0xfe])
            .encrypt_with_password_seipdv1(
                &mut rng,
                s2k,
                SymmetricKeyAlgorithm::AES256,
                || "pw".to_string(),
            )
            .unwrap()
            .to_armored_string(Default::default())
            .unwrap();

        let err = OpenPgp.open(&envelope, "pw").expect_err("expected encoding error");
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }
}
