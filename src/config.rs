use core::fmt;
use std::env;

use thiserror::Error;

use crate::models::claims::UserRole;
use crate::store::{ACCESS_TOKEN, REFRESH_TOKEN};

/// The four marketplace front-ends. Each one instantiates the same guard
/// with its own role allow-list instead of re-implementing the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portal {
    Customer,
    Contractor,
    Supervisor,
    Admin,
}

impl Portal {
    pub fn allowed_roles(&self) -> &'static [UserRole] {
        match self {
            Portal::Customer => &[UserRole::Customer],
            Portal::Contractor => &[UserRole::Contractor],
            Portal::Supervisor => &[UserRole::Supervisor],
            Portal::Admin => &[UserRole::Admin],
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Portal::Customer => "customer",
            Portal::Contractor => "contractor",
            Portal::Supervisor => "supervisor",
            Portal::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_BASE_URL must be set")]
    MissingBaseUrl,
}

/// Per-portal guard configuration: where to renew, which storage keys hold
/// the credentials, and which roles the portal admits. An empty allow-list
/// admits every role.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub refresh_url: String,
    pub login_url: String,
    pub access_key: String,
    pub refresh_key: String,
    pub allowed_roles: Vec<UserRole>,
}

impl GuardConfig {
    pub fn for_portal(base_url: &str, portal: Portal) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            refresh_url: format!("{}/api/token/refresh/", base),
            login_url: format!("{}/api/login/", base),
            access_key: ACCESS_TOKEN.to_owned(),
            refresh_key: REFRESH_TOKEN.to_owned(),
            allowed_roles: portal.allowed_roles().to_vec(),
        }
    }

    pub fn from_env(portal: Portal) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file

        let base_url = env::var("API_BASE_URL").map_err(|_| ConfigError::MissingBaseUrl)?;
        Ok(Self::for_portal(&base_url, portal))
    }

    /// Replaces the portal's default role allow-list. Pass an empty slice to
    /// admit every role.
    pub fn with_allowed_roles(mut self, roles: &[UserRole]) -> Self {
        self.allowed_roles = roles.to_vec();
        self
    }

    /// Overrides the storage keys, for portals that historically used
    /// different names for the same credentials.
    pub fn with_storage_keys(mut self, access_key: &str, refresh_key: &str) -> Self {
        self.access_key = access_key.to_owned();
        self.refresh_key = refresh_key.to_owned();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_config_builds_endpoint_urls() {
        let config = GuardConfig::for_portal("http://localhost:8000", Portal::Customer);
        assert_eq!(config.refresh_url, "http://localhost:8000/api/token/refresh/");
        assert_eq!(config.login_url, "http://localhost:8000/api/login/");
        assert_eq!(config.access_key, "access");
        assert_eq!(config.refresh_key, "refresh");
    }

    #[test]
    fn trailing_slash_on_base_url_is_tolerated() {
        let config = GuardConfig::for_portal("http://localhost:8000/", Portal::Customer);
        assert_eq!(config.refresh_url, "http://localhost:8000/api/token/refresh/");
    }

    #[test]
    fn each_portal_admits_its_own_role() {
        assert_eq!(
            Portal::Supervisor.allowed_roles(),
            &[UserRole::Supervisor]
        );
        assert_eq!(Portal::Admin.allowed_roles(), &[UserRole::Admin]);
    }

    #[test]
    fn allow_list_override_replaces_the_default() {
        let config = GuardConfig::for_portal("http://localhost:8000", Portal::Supervisor)
            .with_allowed_roles(&[UserRole::Supervisor, UserRole::Admin]);
        assert_eq!(
            config.allowed_roles,
            vec![UserRole::Supervisor, UserRole::Admin]
        );
    }

    #[test]
    fn storage_key_override_is_applied() {
        let config = GuardConfig::for_portal("http://localhost:8000", Portal::Supervisor)
            .with_storage_keys("token", "refresh_token");
        assert_eq!(config.access_key, "token");
        assert_eq!(config.refresh_key, "refresh_token");
    }
}
