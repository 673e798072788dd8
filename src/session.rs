use std::sync::Arc;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::guard::SessionGuard;
use crate::renewal::RenewalGate;
use crate::services::refresh::{HttpTokenRefresher, TokenRefreshService};
use crate::store::CredentialStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("request could not be sent: {0}")]
    Transport(String),
    #[error("login rejected with status {0}")]
    LoginRejected(u16),
    #[error("login response did not contain a credential pair")]
    MalformedLogin,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

/// One portal's handle on the session: login/logout, bearer-injected API
/// requests, and guards for protected views. Guards created from the same
/// client share the renewal gate, so simultaneous mounts renew once.
pub struct SessionClient {
    config: Arc<GuardConfig>,
    store: Arc<dyn CredentialStore>,
    http: Client,
    refresher: Arc<dyn TokenRefreshService>,
    gate: Arc<RenewalGate>,
}

impl SessionClient {
    pub fn new(config: GuardConfig, store: Arc<dyn CredentialStore>) -> Self {
        let http = Client::new();
        let refresher = Arc::new(HttpTokenRefresher::new(
            http.clone(),
            config.refresh_url.clone(),
        ));
        Self {
            config: Arc::new(config),
            store,
            http,
            refresher,
            gate: Arc::new(RenewalGate::new()),
        }
    }

    /// Substitutes the renewal service, keeping everything else. Test seam.
    pub fn with_refresher(
        config: GuardConfig,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefreshService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            http: Client::new(),
            refresher,
            gate: Arc::new(RenewalGate::new()),
        }
    }

    /// A fresh guard for one protected-view mount.
    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(
            self.config.clone(),
            self.store.clone(),
            self.refresher.clone(),
            self.gate.clone(),
        )
    }

    /// Exchanges portal credentials for a token pair and stores both.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let res = self
            .http
            .post(&self.config.login_url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            debug!(%status, "login rejected");
            return Err(SessionError::LoginRejected(status.as_u16()));
        }

        let body: LoginResponse = res.json().await.map_err(|_| SessionError::MalformedLogin)?;
        self.store.set(&self.config.access_key, &body.access);
        self.store.set(&self.config.refresh_key, &body.refresh);
        debug!("stored credential pair after login");
        Ok(())
    }

    /// Drops both stored credentials. The next guard resolution redirects
    /// to login.
    pub fn logout(&self) {
        self.store.remove(&self.config.access_key);
        self.store.remove(&self.config.refresh_key);
        debug!("cleared stored credentials");
    }

    /// Builds a request with the stored access credential attached as a
    /// bearer token, when one is present.
    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.store.get(&self.config.access_key) {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Sends a request built with [`Self::request`]. A 401 response drops
    /// the stored access credential so the next guard resolution renews or
    /// redirects.
    pub async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Response, SessionError> {
        let res = builder
            .send()
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))?;

        if res.status() == StatusCode::UNAUTHORIZED {
            warn!("request returned 401, clearing stored access credential");
            self.store.remove(&self.config.access_key);
        }

        Ok(res)
    }

    pub async fn get(&self, url: &str) -> Result<Response, SessionError> {
        self.execute(self.request(Method::GET, url)).await
    }
}
