//! Unauthenticated landing view.

use crate::remote::AuthApiTrait;
use crate::types::errors::AuthError;
use crate::types::session::AuthRedirect;

/// What the entry route should do when opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// No session; show the login screen.
    Stay,
    /// Already signed in; skip the login screen entirely.
    RedirectToDashboard,
}

pub struct EntryView;

impl EntryView {
    /// Session check on mount: an already-authenticated visitor never sees
    /// the login screen.
    pub async fn open<A: AuthApiTrait>(auth: &A) -> EntryOutcome {
        match auth.get_session().await {
            Ok(Some(_)) => EntryOutcome::RedirectToDashboard,
            Ok(None) => EntryOutcome::Stay,
            Err(e) => {
                tracing::debug!(error = %e, "session check failed on entry");
                EntryOutcome::Stay
            }
        }
    }

    /// Starts the OAuth sign-in, returning the URL the shell should send the
    /// browser to. `redirect_to` is the application's own origin.
    pub async fn login<A: AuthApiTrait>(
        auth: &A,
        provider: &str,
        redirect_to: &str,
    ) -> Result<AuthRedirect, AuthError> {
        auth.begin_oauth(provider, redirect_to).await
    }
}
