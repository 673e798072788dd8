use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::services::refresh::{RefreshError, RefreshRequest, RefreshResponse, TokenRefreshService};

/// Talks to the backend's token refresh endpoint.
pub struct HttpTokenRefresher {
    client: Client,
    refresh_url: String,
}

impl HttpTokenRefresher {
    pub fn new(client: Client, refresh_url: impl Into<String>) -> Self {
        Self {
            client,
            refresh_url: refresh_url.into(),
        }
    }
}

#[async_trait]
impl TokenRefreshService for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<String, RefreshError> {
        let res = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            debug!(%status, "renewal endpoint rejected the refresh credential");
            return Err(RefreshError::Rejected(status.as_u16()));
        }

        let body: RefreshResponse = res
            .json()
            .await
            .map_err(|_| RefreshError::MalformedResponse)?;
        Ok(body.access)
    }
}
