//! List state for the dashboard's bookmark collection.

use crate::remote::BookmarkApiTrait;
use crate::types::bookmark::{Bookmark, NewBookmark};

/// Result of a reconciling load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched list differed from local state and replaced it.
    Refreshed,
    /// The fetched list matched local state; nothing to re-render.
    Unchanged,
    /// The request failed; prior state was kept.
    Failed,
}

/// Result of submitting the add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The created row, already prepended to local state.
    Added(Bookmark),
    /// Empty draft title/url or missing owner; no request was issued.
    Rejected,
    /// The create request failed; list and drafts are untouched.
    Failed,
}

/// Bookmarks for one signed-in owner, newest first, plus the add-form draft.
///
/// Two writers feed this list: optimistic local mutations and reconciling
/// loads triggered by change notifications. The load is authoritative — it
/// replaces the list wholesale, so replaying it after an optimistic update
/// converges instead of duplicating rows. `version` moves only when the
/// visible list does, letting a caller skip redundant re-renders.
pub struct BookmarkListModel {
    owner: String,
    items: Vec<Bookmark>,
    version: u64,
    draft_title: String,
    draft_url: String,
}

impl BookmarkListModel {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            items: Vec::new(),
            version: 0,
            draft_title: String::new(),
            draft_url: String::new(),
        }
    }

    pub fn items(&self) -> &[Bookmark] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.items.iter().find(|b| b.id == id)
    }

    /// Render generation; bumped whenever the visible list changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn draft(&self) -> (&str, &str) {
        (&self.draft_title, &self.draft_url)
    }

    pub fn set_draft(&mut self, title: &str, url: &str) {
        self.draft_title = title.to_string();
        self.draft_url = url.to_string();
    }

    /// Fetches all bookmarks, newest first, and replaces local state.
    ///
    /// Failures are silent to the caller's UI: the prior list is kept and the
    /// outcome says so. An identical fetch result leaves `version` alone.
    pub async fn load<S: BookmarkApiTrait>(&mut self, store: &S) -> LoadOutcome {
        match store.list_bookmarks().await {
            Ok(rows) => {
                if rows == self.items {
                    LoadOutcome::Unchanged
                } else {
                    self.items = rows;
                    self.version += 1;
                    LoadOutcome::Refreshed
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "bookmark load failed; keeping previous list");
                LoadOutcome::Failed
            }
        }
    }

    /// Submits the add form for the current drafts.
    ///
    /// An empty draft field (or a missing owner id) is declined without a
    /// request, and the drafts keep their values.
    pub async fn add<S: BookmarkApiTrait>(&mut self, store: &S) -> AddOutcome {
        if self.draft_title.is_empty() || self.draft_url.is_empty() || self.owner.is_empty() {
            return AddOutcome::Rejected;
        }
        let row = NewBookmark {
            title: self.draft_title.clone(),
            url: self.draft_url.clone(),
            owner: self.owner.clone(),
        };
        match store.insert_bookmark(row).await {
            Ok(bookmark) => {
                // New rows are always the most recent, so the head insert
                // keeps the created_at-descending order intact.
                self.items.insert(0, bookmark.clone());
                self.version += 1;
                self.draft_title.clear();
                self.draft_url.clear();
                AddOutcome::Added(bookmark)
            }
            Err(e) => {
                tracing::warn!(error = %e, "bookmark create failed");
                AddOutcome::Failed
            }
        }
    }

    /// Deletes a bookmark. The row leaves local state immediately; the server
    /// response is not consulted, so a failed delete resurfaces the row on
    /// the next reconciling load.
    pub async fn remove<S: BookmarkApiTrait>(&mut self, store: &S, id: &str) {
        let before = self.items.len();
        self.items.retain(|b| b.id != id);
        if self.items.len() != before {
            self.version += 1;
        }
        if let Err(e) = store.delete_bookmark(id).await {
            tracing::warn!(error = %e, id, "bookmark delete failed; row already removed locally");
        }
    }

    /// Mirrors a committed edit into local state.
    pub fn apply_patch(&mut self, id: &str, title: &str, url: &str) {
        if let Some(row) = self.items.iter_mut().find(|b| b.id == id) {
            row.title = title.to_string();
            row.url = url.to_string();
            self.version += 1;
        }
    }
}
