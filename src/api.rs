//! JSON bodies exchanged with the service.

use serde::{Deserialize, Serialize};

/// Body of `POST /secret`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRequest {
    /// Armored envelope; never the plaintext.
    pub message: String,
    /// Lifetime in seconds.
    pub expiration: u64,
    pub one_time: bool,
}

/// Both endpoints answer with a single `message` field: the assigned
/// identifier for `POST /secret`, the stored envelope for `GET /secret/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    /// The `message` field, or `""` when absent or null.
    pub fn into_message(self) -> String {
        self.message.unwrap_or_default()
    }
}
