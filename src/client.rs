//! Blocking client for a Yopass service.
//!
//! `store` and `fetch` never fail loudly: any problem (unknown expiration,
//! unreachable service, bad status, wrong passphrase, malformed envelope)
//! turns into an empty string. `try_store` and `try_fetch` are the same
//! operations with the reason kept.

use std::fmt;

use reqwest::blocking::Response;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::api::{MessageResponse, StoreRequest};
use crate::config::{Timeout, validate_base_url};
use crate::envelope::{EnvelopeCipher, OpenPgp};
use crate::error::{ErrorCategory, ErrorKind, Result, YopassError};
use crate::expiration::Expiration;
use crate::passphrase;
use crate::share_url::{self, resolve};

const USER_AGENT: &str = concat!("yopass-client/", env!("CARGO_PKG_VERSION"));

pub struct Client {
    base_url: String,
    timeout: Timeout,
    http: reqwest::blocking::Client,
    cipher: Box<dyn EnvelopeCipher + Send + Sync>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn build_http(timeout: Timeout) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout.request());
    if let Some(connect) = timeout.connect() {
        builder = builder.connect_timeout(connect);
    }
    builder.build().map_err(|e| {
        YopassError::with_source(
            ErrorCategory::Internal,
            format!("failed to build HTTP client: {}", e),
            e,
        )
    })
}

fn transport_error(e: reqwest::Error) -> YopassError {
    let msg = if e.is_timeout() {
        "request to Yopass timed out".to_string()
    } else {
        format!("request to Yopass failed: {}", e)
    };
    YopassError::with_kind_and_source(ErrorCategory::Remote, ErrorKind::Transport, msg, e)
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    response.error_for_status().map_err(|e| {
        YopassError::with_kind_and_source(
            ErrorCategory::Remote,
            ErrorKind::HttpStatus,
            format!("Yopass answered with status {}", status),
            e,
        )
    })
}

fn read_message(response: Response) -> Result<String> {
    let body: MessageResponse = response.json().map_err(|e| {
        YopassError::with_kind_and_source(
            ErrorCategory::Remote,
            ErrorKind::ResponseFormat,
            "Yopass response is not the expected JSON",
            e,
        )
    })?;
    Ok(body.into_message())
}

impl Client {
    /// Create a client for the service at `base_url`, with no timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;
        Ok(Self {
            base_url,
            timeout: Timeout::Unbounded,
            http: build_http(Timeout::Unbounded)?,
            cipher: Box::new(OpenPgp),
        })
    }

    pub fn with_timeout<T>(mut self, timeout: T) -> Result<Self>
    where
        T: TryInto<Timeout>,
        T::Error: Into<YopassError>,
    {
        self.set_timeout(timeout)?;
        Ok(self)
    }

    /// Replace the encryption provider.
    pub fn with_cipher(mut self, cipher: impl EnvelopeCipher + Send + Sync + 'static) -> Self {
        self.cipher = Box::new(cipher);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fails with an `InvalidBaseUrl` error, keeping the previous value,
    /// unless `value` is an http(s) URL.
    pub fn set_base_url(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        validate_base_url(&value)?;
        self.base_url = value;
        Ok(())
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Fails with an `InvalidTimeout` error, keeping the previous value,
    /// if `value` does not describe a timeout.
    pub fn set_timeout<T>(&mut self, value: T) -> Result<()>
    where
        T: TryInto<Timeout>,
        T::Error: Into<YopassError>,
    {
        let timeout = value.try_into().map_err(Into::<YopassError>::into)?;
        self.http = build_http(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    pub fn generate_passphrase(&self, length: usize) -> String {
        passphrase::generate_passphrase(length)
    }

    /// `{base_url}/#/s/{secret_id}/{password}`, or `""` for an empty id.
    pub fn secret_url(&self, secret_id: &str, password: &str) -> String {
        share_url::secret_url(&self.base_url, secret_id, password)
    }

    /// Encrypt and upload `message`, returning the identifier the service
    /// assigned, or `""` on any failure.
    ///
    /// `expiration` is one of `1h`, `1d` or `1w`; anything else returns `""`
    /// without contacting the service.
    pub fn store(&self, message: &str, password: &str, expiration: &str, one_time: bool) -> String {
        let result = expiration
            .parse::<Expiration>()
            .and_then(|expiration| self.try_store(message, password, expiration, one_time));
        result.unwrap_or_else(|e| {
            warn!(error = %e.chain(), "store failed");
            String::new()
        })
    }

    /// Download and decrypt a secret, or `""` on any failure.
    pub fn fetch(&self, secret_id: &str, password: &str) -> String {
        self.try_fetch(secret_id, password).unwrap_or_else(|e| {
            warn!(error = %e.chain(), "fetch failed");
            String::new()
        })
    }

    /// Encrypt `message` under `password`, post it, return the identifier.
    ///
    /// A success response without a `message` field yields `""`.
    #[instrument(skip_all, fields(base_url = %self.base_url, expiration = %expiration, one_time = one_time))]
    pub fn try_store(
        &self,
        message: &str,
        password: &str,
        expiration: Expiration,
        one_time: bool,
    ) -> Result<String> {
        let url = resolve(&self.base_url, "/secret")?;
        let body = StoreRequest {
            message: self.cipher.seal(message, password)?,
            expiration: expiration.as_secs(),
            one_time,
        };

        debug!(%url, "posting secret");
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .map_err(transport_error)?;
        let id = read_message(check_status(response)?)?;
        debug!(secret_id = %id, "secret stored");
        Ok(id)
    }

    /// Fetch the envelope stored under `secret_id` and open it with `password`.
    ///
    /// An unknown identifier surfaces as an `HttpStatus` error, or, if the
    /// service answers without an envelope, as an armoring error.
    #[instrument(skip_all, fields(base_url = %self.base_url, secret_id = %secret_id))]
    pub fn try_fetch(&self, secret_id: &str, password: &str) -> Result<String> {
        let url = resolve(&self.base_url, &format!("/secret/{}", secret_id))?;

        debug!(%url, "fetching secret");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .map_err(transport_error)?;
        let envelope = read_message(check_status(response)?)?;

        self.cipher.open(&envelope, password)
    }
}
