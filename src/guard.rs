use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::models::claims::Claims;
use crate::renewal::RenewalGate;
use crate::services::refresh::{RefreshError, TokenRefreshService};
use crate::store::CredentialStore;
use crate::utils::jwt::{self, DecodeError};

/// Why a verdict resolved to `invalid`. Portals collapse all of these into
/// a login redirect; the distinction survives in logs and in the resolution
/// result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no access credential in storage")]
    MissingCredential,
    #[error("stored access credential is malformed: {0}")]
    MalformedCredential(#[from] DecodeError),
    #[error("access credential is expired and no refresh credential is available")]
    ExpiredCredential,
    #[error("credential renewal failed: {0}")]
    RenewalFailed(#[from] RefreshError),
}

/// Session-validity verdict of a mounted guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unknown,
    Valid,
    Invalid,
}

/// What the portal should render for the protected view.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Granted(Claims),
    RedirectToLogin,
    RedirectToUnauthorized,
}

/// Guards one protected-view mount. The verdict starts `unknown`, resolves
/// exactly once, and stays resolved for the lifetime of the instance; a new
/// mount gets a new guard.
pub struct SessionGuard {
    config: Arc<GuardConfig>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefreshService>,
    gate: Arc<RenewalGate>,
    resolution: OnceCell<Result<Claims, AuthError>>,
}

impl SessionGuard {
    pub fn new(
        config: Arc<GuardConfig>,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefreshService>,
        gate: Arc<RenewalGate>,
    ) -> Self {
        Self {
            config,
            store,
            refresher,
            gate,
            resolution: OnceCell::new(),
        }
    }

    /// The verdict as currently known, without resolving it.
    pub fn verdict(&self) -> Verdict {
        match self.resolution.get() {
            None => Verdict::Unknown,
            Some(Ok(_)) => Verdict::Valid,
            Some(Err(_)) => Verdict::Invalid,
        }
    }

    /// Resolves the verdict, running the verification algorithm on first
    /// call and returning the recorded outcome on every later one.
    pub async fn resolve(&self) -> Verdict {
        match self.resolution().await {
            Ok(_) => Verdict::Valid,
            Err(_) => Verdict::Invalid,
        }
    }

    /// Resolves the verdict and maps it to what the portal should render,
    /// applying the portal's role allow-list on top of validity.
    pub async fn authorize(&self) -> AccessDecision {
        let claims = match self.resolution().await {
            Ok(claims) => claims.clone(),
            Err(err) => {
                debug!(%err, "session verdict is invalid, redirecting to login");
                return AccessDecision::RedirectToLogin;
            }
        };

        if self.config.allowed_roles.is_empty() {
            return AccessDecision::Granted(claims);
        }

        match claims.role {
            Some(role) if self.config.allowed_roles.contains(&role) => {
                AccessDecision::Granted(claims)
            }
            role => {
                warn!(?role, "role is not permitted on this portal");
                AccessDecision::RedirectToUnauthorized
            }
        }
    }

    async fn resolution(&self) -> &Result<Claims, AuthError> {
        self.resolution.get_or_init(|| self.evaluate()).await
    }

    async fn evaluate(&self) -> Result<Claims, AuthError> {
        let token = match self.store.get(&self.config.access_key) {
            Some(token) => token,
            None => {
                debug!("no access credential in storage");
                return Err(AuthError::MissingCredential);
            }
        };

        let claims = jwt::decode_claims(&token)?;

        let now = jwt::now_unix();
        if !jwt::is_expired(&claims, now) {
            debug!(exp = claims.exp, "access credential is still valid");
            return Ok(claims);
        }

        debug!(exp = claims.exp, "access credential expired, renewing");
        let refresh_token = match self.store.get(&self.config.refresh_key) {
            Some(token) => token,
            None => {
                debug!("no refresh credential to renew with");
                return Err(AuthError::ExpiredCredential);
            }
        };

        match self.gate.renew(&refresh_token, self.refresher.as_ref()).await {
            Ok(access) => {
                self.store.set(&self.config.access_key, &access);
                debug!("stored renewed access credential");
                // Identity claims carry over from the replaced credential.
                Ok(claims)
            }
            Err(err) => {
                warn!(%err, "renewal failed, session is invalid");
                Err(AuthError::RenewalFailed(err))
            }
        }
    }
}
