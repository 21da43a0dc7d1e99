//! In-memory implementation of the remote data service.
//!
//! Backs the test suite and local experiments: rows live in process, change
//! events go out on a broadcast channel, and read/write failures can be
//! injected to exercise the client's degradation paths. Cloning the service
//! yields another handle onto the same state, the way two browser sessions
//! share one hosted backend.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::remote::realtime::{self, Subscription};
use crate::remote::{AuthApiTrait, BookmarkApiTrait};
use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::change::{ChangeEvent, ChangeKind};
use crate::types::errors::{AuthError, FeedError, StoreError};
use crate::types::session::{AuthRedirect, AuthUser, Session};

/// In-process data service with injectable failures.
#[derive(Clone)]
pub struct MemoryService {
    inner: Arc<Inner>,
}

struct Inner {
    rows: Mutex<Vec<Bookmark>>,
    session: Mutex<Option<Session>>,
    tx: broadcast::Sender<ChangeEvent>,
    clock: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryService {
    pub fn new() -> Self {
        let (tx, _rx) = realtime::channel();
        Self {
            inner: Arc::new(Inner {
                rows: Mutex::new(Vec::new()),
                session: Mutex::new(None),
                tx,
                clock: AtomicI64::new(1),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Establishes a signed-in session for `user_id` without an OAuth dance.
    pub fn sign_in_as(&self, user_id: &str, email: Option<&str>) {
        let session = Session {
            access_token: format!("memory-token-{}", user_id),
            refresh_token: "memory-refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: user_id.to_string(),
                email: email.map(str::to_string),
            },
        };
        if let Ok(mut guard) = self.inner.session.lock() {
            *guard = Some(session);
        }
    }

    /// When set, session checks and list requests fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// When set, insert/update/delete requests fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Rows as the service holds them — the authoritative state.
    pub fn server_rows(&self) -> Vec<Bookmark> {
        let rows = match self.inner.rows.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        };
        Self::sorted(rows)
    }

    fn next_created_at(&self) -> i64 {
        self.inner.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn emit(&self, kind: ChangeKind, row_id: &str) {
        let _ = self.inner.tx.send(ChangeEvent {
            kind,
            collection: "bookmarks".to_string(),
            row_id: Some(row_id.to_string()),
        });
    }

    fn sorted(mut rows: Vec<Bookmark>) -> Vec<Bookmark> {
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthApiTrait for MemoryService {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(AuthError::NetworkError("injected failure".to_string()));
        }
        Ok(match self.inner.session.lock() {
            Ok(guard) => (*guard).clone(),
            Err(_) => None,
        })
    }

    async fn begin_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<AuthRedirect, AuthError> {
        Ok(AuthRedirect {
            url: format!(
                "memory://authorize?provider={}&redirect_to={}",
                provider, redirect_to
            ),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        // Any code signs in a local identity derived from it.
        let user_id = format!("user-{}", code);
        self.sign_in_as(&user_id, None);
        match self.inner.session.lock() {
            Ok(guard) => (*guard)
                .clone()
                .ok_or_else(|| AuthError::OAuthFlow("session not stored".to_string())),
            Err(_) => Err(AuthError::OAuthFlow("session not stored".to_string())),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Ok(mut guard) = self.inner.session.lock() {
            *guard = None;
        }
        Ok(())
    }
}

impl BookmarkApiTrait for MemoryService {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::NetworkError("injected failure".to_string()));
        }
        Ok(self.server_rows())
    }

    async fn insert_bookmark(&self, row: NewBookmark) -> Result<Bookmark, StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::NetworkError("injected failure".to_string()));
        }
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: row.title,
            url: row.url,
            owner: row.owner,
            created_at: self.next_created_at(),
        };
        if let Ok(mut rows) = self.inner.rows.lock() {
            rows.push(bookmark.clone());
        }
        self.emit(ChangeKind::Insert, &bookmark.id);
        Ok(bookmark)
    }

    async fn update_bookmark(&self, id: &str, patch: BookmarkPatch) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::NetworkError("injected failure".to_string()));
        }
        let mut changed = false;
        if let Ok(mut rows) = self.inner.rows.lock() {
            if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
                if let Some(title) = patch.title {
                    row.title = title;
                }
                if let Some(url) = patch.url {
                    row.url = url;
                }
                changed = true;
            }
        }
        if changed {
            self.emit(ChangeKind::Update, id);
        }
        // Updating an absent row is not an error, matching the hosted service.
        Ok(())
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::NetworkError("injected failure".to_string()));
        }
        let mut removed = false;
        if let Ok(mut rows) = self.inner.rows.lock() {
            let before = rows.len();
            rows.retain(|r| r.id != id);
            removed = rows.len() != before;
        }
        if removed {
            self.emit(ChangeKind::Delete, id);
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription, FeedError> {
        Ok(Subscription::new(self.inner.tx.subscribe(), None))
    }
}
