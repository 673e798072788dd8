pub mod client;
pub mod mock;

pub use client::HttpTokenRefresher;
pub use mock::MockTokenRefresher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Renewal failures are terminal for the current verdict; nothing retries.
/// The variants stay cloneable so a deduplicated in-flight renewal can hand
/// the same outcome to every waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("renewal request could not be sent: {0}")]
    Transport(String),
    #[error("renewal endpoint rejected the credential with status {0}")]
    Rejected(u16),
    #[error("renewal response did not contain an access credential")]
    MalformedResponse,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[async_trait]
pub trait TokenRefreshService: Send + Sync {
    /// Exchanges a refresh credential for a new access credential.
    async fn refresh(&self, refresh_token: &str) -> Result<String, RefreshError>;
}
