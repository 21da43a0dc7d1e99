//! Protected dashboard route: the signed-in user's bookmarks with live
//! updates.

use crate::remote::{AuthApiTrait, BookmarkApiTrait, Subscription};
use crate::types::change::ChangeEvent;
use crate::views::bookmark_list::{BookmarkListModel, LoadOutcome};
use crate::views::edit_controller::EditController;
use crate::views::session_guard::{GuardOutcome, SessionGuard, UserContext};

/// State behind the dashboard route.
pub struct Dashboard {
    pub user: UserContext,
    pub list: BookmarkListModel,
    pub edit: EditController,
    subscription: Option<Subscription>,
}

impl Dashboard {
    /// Runs the session guard and, when it passes, brings the view up: the
    /// initial load plus the change subscription. `None` means the visitor
    /// must be sent to the entry route — no bookmark data is fetched then.
    pub async fn open<R: AuthApiTrait + BookmarkApiTrait>(remote: &R) -> Option<Dashboard> {
        let user = match SessionGuard::check(remote).await {
            GuardOutcome::Authenticated(user) => user,
            GuardOutcome::RedirectToEntry => return None,
        };
        let mut list = BookmarkListModel::new(&user.user_id);
        list.load(remote).await;
        let subscription = match remote.subscribe().await {
            Ok(sub) => Some(sub),
            Err(e) => {
                tracing::warn!(error = %e, "change subscription failed; live updates disabled");
                None
            }
        };
        Some(Dashboard {
            user,
            list,
            edit: EditController::new(),
            subscription,
        })
    }

    /// Waits for the next change notification. Pends forever once the
    /// subscription is gone, so a caller's select loop stays valid.
    pub async fn next_change(&mut self) -> ChangeEvent {
        loop {
            match self.subscription.as_mut() {
                Some(sub) => match sub.recv().await {
                    Some(event) => return event,
                    None => self.subscription = None,
                },
                None => std::future::pending::<()>().await,
            }
        }
    }

    /// Drains queued notifications without blocking. `true` when at least
    /// one arrived, meaning a reconciling load is due.
    pub fn drain_pending_changes(&mut self) -> bool {
        let mut any = false;
        if let Some(sub) = self.subscription.as_mut() {
            while sub.try_recv().is_some() {
                any = true;
            }
        }
        any
    }

    /// Reconciling load: the response replaces the whole list, whatever the
    /// notification said.
    pub async fn reconcile<S: BookmarkApiTrait>(&mut self, store: &S) -> LoadOutcome {
        self.list.load(store).await
    }

    /// Tears the view down, closing the change channel. In-flight responses
    /// landing after this point have nothing left to update.
    pub fn close(&mut self) {
        self.subscription = None;
    }

    /// Whether the change channel is live.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}
