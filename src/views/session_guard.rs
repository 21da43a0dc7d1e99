//! Route protection for the dashboard.

use crate::remote::AuthApiTrait;
use crate::types::session::Session;

/// Identity of the signed-in user, as exposed to dependent views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// Scopes every write the user makes.
    pub user_id: String,
    /// Shown in the dashboard header.
    pub email: Option<String>,
}

impl UserContext {
    pub(crate) fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
        }
    }
}

/// Result of a session check on a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Authenticated(UserContext),
    RedirectToEntry,
}

pub struct SessionGuard;

impl SessionGuard {
    /// Queries the service for an active session.
    ///
    /// A missing session and a failed check are treated identically: the
    /// visitor is sent to the entry route and no local state is populated.
    /// No retry.
    pub async fn check<A: AuthApiTrait>(auth: &A) -> GuardOutcome {
        match auth.get_session().await {
            Ok(Some(session)) => GuardOutcome::Authenticated(UserContext::from_session(&session)),
            Ok(None) => GuardOutcome::RedirectToEntry,
            Err(e) => {
                tracing::debug!(error = %e, "session check failed");
                GuardOutcome::RedirectToEntry
            }
        }
    }
}
