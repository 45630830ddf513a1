//! Share links of the form `{base_url}/#/s/{id}/{password}`.
//!
//! The password lives in the fragment, so browsers never send it to the
//! server; the client never sends these links anywhere either.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use tracing::warn;

use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};

/// Identifier and passphrase recovered from a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSecret {
    pub id: String,
    /// `None` when the link was shared without its passphrase.
    pub password: Option<String>,
}

/// Resolve `reference` (an absolute path) against `base_url`.
///
/// The base is normalized on the way: scheme and host come out lowercased
/// and default ports are dropped. HTTP requests do not care; share links
/// are built by [`secret_url`] instead so they keep the base as written.
pub(crate) fn resolve(base_url: &str, reference: &str) -> Result<Url> {
    Url::parse(base_url)
        .and_then(|base| base.join(reference))
        .map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidBaseUrl,
                format!("cannot build URL from base {:?}: {}", base_url, e),
                e,
            )
        })
}

/// `scheme://authority` of `base_url`, scheme lowercased, authority as written.
fn origin(base_url: &str) -> Option<String> {
    let (scheme, rest) = base_url.split_once("://")?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    if scheme.is_empty() || authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme.to_ascii_lowercase(), authority))
}

/// Build the link a recipient opens to read the secret.
///
/// Returns `""` when `secret_id` is empty. Any path or query on the base is
/// replaced. `secret_id` and `password` go into the fragment verbatim, and an
/// empty `password` leaves a trailing slash.
pub fn secret_url(base_url: &str, secret_id: &str, password: &str) -> String {
    if secret_id.is_empty() {
        return String::new();
    }
    match origin(base_url) {
        Some(origin) => format!("{}/#/s/{}/{}", origin, secret_id, password),
        None => {
            warn!(base_url, "could not build secret URL");
            String::new()
        }
    }
}

fn decode_part(part: &str, link: &str) -> Result<String> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            YopassError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidSecretUrl,
                format!("share link is not valid UTF-8 once decoded: {:?}", link),
                e,
            )
        })
}

/// Take a share link apart into identifier and (optional) passphrase.
///
/// Characters the URL parser escaped in the fragment (spaces, quotes,
/// angle brackets) are decoded again, so this inverts [`secret_url`].
pub fn parse_secret_url(link: &str) -> Result<SharedSecret> {
    let invalid = |msg: &str| {
        YopassError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidSecretUrl,
            format!("{}: {:?}", msg, link),
        )
    };

    let url = Url::parse(link).map_err(|e| {
        YopassError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidSecretUrl,
            format!("not a URL: {:?}", link),
            e,
        )
    })?;
    let fragment = url
        .fragment()
        .ok_or_else(|| invalid("share link has no fragment"))?;
    let rest = fragment
        .strip_prefix("/s/")
        .ok_or_else(|| invalid("share link fragment does not start with /s/"))?;

    let (id, password) = match rest.split_once('/') {
        Some((id, password)) => (id, password),
        None => (rest, ""),
    };
    if id.is_empty() {
        return Err(invalid("share link has no secret identifier"));
    }

    let password = decode_part(password, link)?;
    Ok(SharedSecret {
        id: decode_part(id, link)?,
        password: (!password.is_empty()).then_some(password),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_URL: &str = "https://api.yopass.se";

    #[test]
    fn test_secret_url() {
        assert_eq!(secret_url(API_URL, "1", "2"), format!("{API_URL}/#/s/1/2"));
        assert_eq!(secret_url(API_URL, "1", ""), format!("{API_URL}/#/s/1/"));
        assert_eq!(secret_url(API_URL, "", "2"), "");
    }

    #[test]
    fn test_secret_url_with_port_and_path() {
        assert_eq!(
            secret_url("http://localhost:1337", "abc", "pw"),
            "http://localhost:1337/#/s/abc/pw"
        );
        // Absolute reference: the base path is replaced, as with the web UI.
        assert_eq!(
            secret_url("https://example.com/api/", "abc", "pw"),
            "https://example.com/#/s/abc/pw"
        );
    }

    #[test]
    fn test_secret_url_keeps_base_as_written() {
        assert_eq!(
            secret_url("http://999.1.1.1", "abc", "pw"),
            "http://999.1.1.1/#/s/abc/pw"
        );
        assert_eq!(
            secret_url("HTTPS://API.YOPASS.SE", "1", "2"),
            "https://API.YOPASS.SE/#/s/1/2"
        );
        assert_eq!(
            secret_url("https://yopass.se:443?lang=en", "1", "2"),
            "https://yopass.se:443/#/s/1/2"
        );
        assert_eq!(secret_url("yopass.se", "1", "2"), "");
    }

    #[test]
    fn test_secret_url_password_verbatim() {
        assert_eq!(
            secret_url(API_URL, "1", "a b<c>\"d`"),
            format!("{API_URL}/#/s/1/a b<c>\"d`")
        );
    }

    #[test]
    fn test_parse_decodes_escaped_password() {
        let link = secret_url(API_URL, "abc", "my pass <\"x\">");
        let shared = parse_secret_url(&link).unwrap();
        assert_eq!(shared.id, "abc");
        assert_eq!(shared.password.as_deref(), Some("my pass <\"x\">"));

        let shared = parse_secret_url("https://yopass.se/#/s/abc/my%20pass").unwrap();
        assert_eq!(shared.password.as_deref(), Some("my pass"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let link = secret_url(API_URL, "6a1a3a5e-2c1b-4bd5-a1d8-1c5a0a0e6b53", "Xy12abc");
        assert_eq!(
            parse_secret_url(&link).unwrap(),
            SharedSecret {
                id: "6a1a3a5e-2c1b-4bd5-a1d8-1c5a0a0e6b53".into(),
                password: Some("Xy12abc".into()),
            }
        );
    }

    #[test]
    fn test_parse_without_password() {
        for link in ["https://yopass.se/#/s/abc/", "https://yopass.se/#/s/abc"] {
            let shared = parse_secret_url(link).unwrap();
            assert_eq!(shared.id, "abc");
            assert_eq!(shared.password, None);
        }
    }

    #[test]
    fn test_parse_rejects_other_links() {
        for link in [
            "abc",
            "https://yopass.se/",
            "https://yopass.se/#/f/abc/pw",
            "https://yopass.se/#/s/",
            "https://yopass.se/#/s//pw",
        ] {
            let err = parse_secret_url(link).expect_err(link);
            assert_eq!(err.kind, Some(ErrorKind::InvalidSecretUrl));
        }
    }
}
