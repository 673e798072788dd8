use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::services::refresh::{RefreshError, TokenRefreshService};

/// Deduplicates concurrent renewal attempts. Two guards mounted at the same
/// time over the same expired credential pair share one in-flight call to the
/// renewal endpoint and both observe its outcome.
#[derive(Default)]
pub struct RenewalGate {
    inflight: DashMap<String, Arc<OnceCell<Result<String, RefreshError>>>>,
}

impl RenewalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn renew(
        &self,
        refresh_token: &str,
        service: &dyn TokenRefreshService,
    ) -> Result<String, RefreshError> {
        let cell = self
            .inflight
            .entry(refresh_token.to_owned())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let outcome = cell
            .get_or_init(|| async {
                debug!("issuing renewal call");
                service.refresh(refresh_token).await
            })
            .await
            .clone();

        // A caller arriving after this point starts a fresh renewal.
        self.inflight.remove(refresh_token);

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::refresh::MockTokenRefresher;
    use std::time::Duration;

    #[tokio::test]
    async fn single_caller_gets_the_new_token() {
        let gate = RenewalGate::new();
        let service = MockTokenRefresher::succeeding("fresh");

        let access = gate.renew("refresh-token", &service).await.unwrap();

        assert_eq!(access, "fresh");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_renewal_call() {
        let gate = RenewalGate::new();
        let service =
            MockTokenRefresher::succeeding("fresh").with_delay(Duration::from_millis(20));

        let (first, second) = tokio::join!(
            gate.renew("refresh-token", &service),
            gate.renew("refresh-token", &service),
        );

        assert_eq!(first.unwrap(), "fresh");
        assert_eq!(second.unwrap(), "fresh");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn distinct_credentials_renew_independently() {
        let gate = RenewalGate::new();
        let service =
            MockTokenRefresher::succeeding("fresh").with_delay(Duration::from_millis(20));

        let (first, second) = tokio::join!(
            gate.renew("refresh-a", &service),
            gate.renew("refresh-b", &service),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_and_not_retried() {
        let gate = RenewalGate::new();
        let service = MockTokenRefresher::failing(RefreshError::Rejected(401))
            .with_delay(Duration::from_millis(20));

        let (first, second) = tokio::join!(
            gate.renew("refresh-token", &service),
            gate.renew("refresh-token", &service),
        );

        assert_eq!(first.unwrap_err(), RefreshError::Rejected(401));
        assert_eq!(second.unwrap_err(), RefreshError::Rejected(401));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn sequential_callers_renew_separately() {
        let gate = RenewalGate::new();
        let service = MockTokenRefresher::succeeding("fresh");

        gate.renew("refresh-token", &service).await.unwrap();
        gate.renew("refresh-token", &service).await.unwrap();

        assert_eq!(service.call_count(), 2);
    }
}
