//! Request signing
//!
//! Every timetable API request carries the caller's developer id (`devid`)
//! and an HMAC-SHA1 `signature` computed with the security key over the
//! request path and query, `devid` included, `signature` excluded.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;

/// Compute the upper-case hex HMAC-SHA1 of `url` keyed with `secret`
///
/// HMAC accepts keys of any length; should the key ever be rejected the
/// result is empty and the server refuses the request.
#[must_use]
pub fn sign(secret: &[u8], url: &str) -> String {
    let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
        warn!("Failed to create HMAC");
        return String::new();
    };

    mac.update(url.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Developer id and security key, shared read-only by every request
#[derive(Clone)]
pub struct Credentials {
    developer_id: String,
    security_key: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("developer_id", &"[REDACTED]")
            .field("security_key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from a developer id and security key
    pub fn new(developer_id: impl Into<String>, security_key: impl Into<String>) -> Self {
        Self::from_secret(developer_id, SecretString::from(security_key.into()))
    }

    pub(crate) fn from_secret(developer_id: impl Into<String>, security_key: SecretString) -> Self {
        Self {
            developer_id: developer_id.into(),
            security_key,
        }
    }

    /// Append `devid` and `signature` to a request path
    ///
    /// `devid` starts the query string unless `request_path` already has
    /// one; `signature` always comes last.
    #[must_use]
    pub fn sign_request_path(&self, request_path: &str) -> String {
        let separator = if request_path.contains('?') { '&' } else { '?' };
        let url = format!("{request_path}{separator}devid={}", self.developer_id);
        let signature = sign(self.security_key.expose_secret().as_bytes(), &url);

        format!("{url}&signature={signature}")
    }
}
