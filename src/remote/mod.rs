//! cloudmark remote data service layer.
//!
//! All persistence, authentication, and change notification are delegated to
//! a hosted service. The two traits below are the seams the view models are
//! written against; [`rest::RestService`] speaks the hosted service's HTTP
//! dialect and [`memory::MemoryService`] keeps everything in process for
//! tests and local experiments.

pub mod memory;
pub mod pkce;
pub mod realtime;
pub mod rest;

pub use memory::MemoryService;
pub use realtime::Subscription;
pub use rest::RestService;

use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::errors::{AuthError, FeedError, StoreError};
use crate::types::session::{AuthRedirect, Session};

/// Trait defining the authentication operations of the data service.
#[allow(async_fn_in_trait)]
pub trait AuthApiTrait {
    /// Returns the active session, or `None` when signed out.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;
    /// Starts an OAuth sign-in; the caller sends the browser to the URL.
    async fn begin_oauth(&self, provider: &str, redirect_to: &str)
        -> Result<AuthRedirect, AuthError>;
    /// Completes the sign-in started by [`begin_oauth`](Self::begin_oauth).
    async fn exchange_code(&self, code: &str) -> Result<Session, AuthError>;
    /// Ends the session. Local sign-out always succeeds.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Trait defining row operations and change notification on the bookmarks
/// collection.
#[allow(async_fn_in_trait)]
pub trait BookmarkApiTrait {
    /// All bookmarks visible to the caller, ordered `created_at` descending.
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError>;
    /// Creates a row and returns it as the service stored it.
    async fn insert_bookmark(&self, row: NewBookmark) -> Result<Bookmark, StoreError>;
    async fn update_bookmark(&self, id: &str, patch: BookmarkPatch) -> Result<(), StoreError>;
    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError>;
    /// Opens a change-notification channel for the collection.
    async fn subscribe(&self) -> Result<Subscription, FeedError>;
}
