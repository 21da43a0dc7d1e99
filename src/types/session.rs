use serde::{Deserialize, Serialize};

/// Server-issued proof of authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch seconds after which `access_token` is no longer valid.
    #[serde(default)]
    pub expires_at: i64,
    pub user: AuthUser,
}

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Browser hand-off target for an OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRedirect {
    pub url: String,
}
