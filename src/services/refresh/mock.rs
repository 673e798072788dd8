use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::services::refresh::{RefreshError, TokenRefreshService};

/// Scripted refresher for tests: serves a fixed outcome, counts calls, and
/// can hold each call open to let callers overlap.
pub struct MockTokenRefresher {
    outcome: Result<String, RefreshError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockTokenRefresher {
    pub fn succeeding(access_token: &str) -> Self {
        Self {
            outcome: Ok(access_token.to_owned()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RefreshError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenRefreshService for MockTokenRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<String, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
