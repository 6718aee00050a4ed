use serde::{Deserialize, Serialize};

/// The logged-in user as the service stores it in the session.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_active: bool,
}

/// Read-only session context. Views consult it; the form and filter logic never do.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn new(token: Option<String>, user: Option<SessionUser>) -> Self {
        Session { token, user }
    }

    pub fn user_has_access(&self, permission: &str) -> bool {
        self.user
            .as_ref()
            .map(|u| u.permissions.iter().any(|p| p == permission))
            .unwrap_or(false)
    }
}
