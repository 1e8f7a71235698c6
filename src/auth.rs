//! Shared-secret authorization.
//!
//! Two credentials gate the service: the admin password (category and master
//! task administration, manual rollover) and the cron secret presented by the
//! external scheduler as a bearer token. Both come from configuration; an unset
//! secret rejects every attempt.

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use sha2::{Digest, Sha256};

/// Verifies caller credentials against configured secrets.
#[derive(Clone, Default)]
pub struct Gatekeeper {
    admin_password: Option<String>,
    cron_secret: Option<String>,
}

impl Gatekeeper {
    pub fn new(admin_password: Option<String>, cron_secret: Option<String>) -> Self {
        Self {
            admin_password: admin_password.filter(|s| !s.is_empty()),
            cron_secret: cron_secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.admin_password.clone(), config.cron_secret.clone())
    }

    /// Check the admin password.
    pub fn verify_admin(&self, provided: Option<&str>) -> ApiResult<()> {
        check(self.admin_password.as_deref(), provided)
    }

    /// Check the scheduler's bearer token.
    pub fn verify_scheduler(&self, bearer: Option<&str>) -> ApiResult<()> {
        check(self.cron_secret.as_deref(), bearer)
    }
}

fn check(expected: Option<&str>, provided: Option<&str>) -> ApiResult<()> {
    match (expected, provided) {
        (Some(expected), Some(provided)) if secrets_match(expected, provided) => Ok(()),
        _ => Err(ApiError::unauthorized()),
    }
}

/// Compare fixed-length digests without early exit.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(provided.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
