//! Application core: the two routes and the state behind them.

use crate::remote::{AuthApiTrait, BookmarkApiTrait};
use crate::types::change::ChangeEvent;
use crate::views::bookmark_list::{AddOutcome, LoadOutcome};
use crate::views::dashboard::Dashboard;
use crate::views::edit_controller::CommitOutcome;
use crate::views::entry::{EntryOutcome, EntryView};

/// The client's two routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Entry,
    Dashboard,
}

/// Defaults for the OAuth hand-off, taken from settings.
#[derive(Debug, Clone)]
pub struct LoginDefaults {
    pub provider: String,
    pub redirect_to: String,
}

impl Default for LoginDefaults {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            redirect_to: String::new(),
        }
    }
}

/// Central application state: the remote service handle, the current route,
/// and the dashboard when it is open.
pub struct App<R: AuthApiTrait + BookmarkApiTrait> {
    remote: R,
    login: LoginDefaults,
    route: Route,
    dashboard: Option<Dashboard>,
}

impl<R: AuthApiTrait + BookmarkApiTrait> App<R> {
    pub fn new(remote: R, login: LoginDefaults) -> Self {
        Self {
            remote,
            login,
            route: Route::Entry,
            dashboard: None,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn login_defaults(&self) -> &LoginDefaults {
        &self.login
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    /// Navigates to a route, letting the guards have the last word: the
    /// dashboard bounces signed-out visitors to entry, and entry forwards
    /// signed-in visitors to the dashboard. Returns where the app landed.
    pub async fn navigate(&mut self, route: Route) -> Route {
        match route {
            Route::Dashboard => self.open_dashboard().await,
            Route::Entry => match EntryView::open(&self.remote).await {
                EntryOutcome::RedirectToDashboard => self.open_dashboard().await,
                EntryOutcome::Stay => {
                    self.close_dashboard();
                    self.route = Route::Entry;
                    Route::Entry
                }
            },
        }
    }

    /// Ends the session and lands on the entry route.
    pub async fn sign_out(&mut self) {
        if let Err(e) = self.remote.sign_out().await {
            tracing::debug!(error = %e, "sign-out request failed");
        }
        self.close_dashboard();
        self.route = Route::Entry;
    }

    /// Reconciling load on the open dashboard. `None` without one.
    pub async fn reload(&mut self) -> Option<LoadOutcome> {
        let Self {
            remote, dashboard, ..
        } = self;
        match dashboard.as_mut() {
            Some(dashboard) => Some(dashboard.reconcile(remote).await),
            None => None,
        }
    }

    /// Submits the add form on the open dashboard.
    pub async fn add_bookmark(&mut self) -> Option<AddOutcome> {
        let Self {
            remote, dashboard, ..
        } = self;
        match dashboard.as_mut() {
            Some(dashboard) => Some(dashboard.list.add(remote).await),
            None => None,
        }
    }

    /// Optimistically removes a bookmark. `false` without an open dashboard.
    pub async fn remove_bookmark(&mut self, id: &str) -> bool {
        let Self {
            remote, dashboard, ..
        } = self;
        match dashboard.as_mut() {
            Some(dashboard) => {
                dashboard.list.remove(remote, id).await;
                true
            }
            None => false,
        }
    }

    /// Commits the edit in progress on the open dashboard.
    pub async fn commit_edit(&mut self) -> Option<CommitOutcome> {
        let Self {
            remote, dashboard, ..
        } = self;
        match dashboard.as_mut() {
            Some(dashboard) => {
                let Dashboard { list, edit, .. } = dashboard;
                Some(edit.commit(remote, list).await)
            }
            None => None,
        }
    }

    /// Waits for the next change notification from the open dashboard.
    /// Pends forever while none is live.
    pub async fn next_change(&mut self) -> ChangeEvent {
        match self.dashboard.as_mut() {
            Some(dashboard) => dashboard.next_change().await,
            None => std::future::pending().await,
        }
    }

    async fn open_dashboard(&mut self) -> Route {
        // Re-opening tears down the previous instance and its subscription.
        self.close_dashboard();
        match Dashboard::open(&self.remote).await {
            Some(dashboard) => {
                self.dashboard = Some(dashboard);
                self.route = Route::Dashboard;
            }
            None => self.route = Route::Entry,
        }
        self.route
    }

    fn close_dashboard(&mut self) {
        if let Some(mut dashboard) = self.dashboard.take() {
            dashboard.close();
        }
    }
}
