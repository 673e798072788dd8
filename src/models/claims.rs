use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "UPPERCASE")] // <- Matches the backend's role strings, e.g. "CUSTOMER"
pub enum UserRole {
    Customer,
    Contractor,
    Supervisor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Customer => "CUSTOMER",
            UserRole::Contractor => "CONTRACTOR",
            UserRole::Supervisor => "SUPERVISOR",
            UserRole::Admin => "ADMIN",
        };
        write!(f, "{}", s)
    }
}

/// Payload of an access credential as the portals see it. Only `exp` is
/// guaranteed; older token generations carried the role under `user_type`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Claims {
    pub exp: usize, // expiration (as UNIX timestamp)
    #[serde(default, alias = "user_type")]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}
