//! Webhook authentication.
//!
//! GitLab sends a shared token in `X-Gitlab-Token`. GitHub signs the raw body
//! with HMAC-SHA256 and sends `sha256=<hex>` in `X-Hub-Signature-256`. Both
//! checks run in constant time with respect to the secret.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const GITLAB_TOKEN_HEADER: &str = "x-gitlab-token";
pub const GITHUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Shared-token check for GitLab deliveries.
#[derive(Clone)]
pub struct GitLabAuth {
    token: String,
}

impl GitLabAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// `true` when `presented` equals the configured token.
    ///
    /// Both sides are hashed first so the comparison length never depends on
    /// the presented value.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let expected = Sha256::digest(self.token.as_bytes());
        let actual = Sha256::digest(presented.as_bytes());
        constant_time_eq(&expected, &actual)
    }
}

impl std::fmt::Debug for GitLabAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabAuth")
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Signature check for GitHub deliveries.
#[derive(Clone)]
pub struct GitHubAuth {
    secret: String,
}

impl GitHubAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// `true` when `signature` is `sha256=<hex>` of the HMAC of `body`.
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> bool {
        let Some(expected) = signature
            .and_then(|s| s.trim().strip_prefix(SIGNATURE_PREFIX))
            .and_then(|hex_digest| hex::decode(hex_digest).ok())
        else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    /// Produces the header value GitHub would send for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mut mac) => {
                mac.update(body);
                format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
            }
            // HMAC accepts keys of any length.
            Err(_) => String::new(),
        }
    }
}

impl std::fmt::Debug for GitHubAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuth")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
