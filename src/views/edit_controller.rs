//! Per-row edit state for the bookmark list.

use crate::remote::BookmarkApiTrait;
use crate::types::bookmark::{Bookmark, BookmarkPatch};
use crate::views::bookmark_list::BookmarkListModel;

/// Draft values for the row being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Result of committing an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The update landed and local state mirrors it; back to Viewing.
    Committed,
    /// No row is in edit mode.
    NotEditing,
    /// The update request failed; the row stays in edit mode.
    Failed,
}

/// Viewing/Editing toggle with a single shared edit target: starting an edit
/// on one row ends any edit in progress on another.
#[derive(Debug, Default)]
pub struct EditController {
    editing: Option<EditBuffer>,
}

impl EditController {
    pub fn new() -> Self {
        Self { editing: None }
    }

    pub fn editing(&self) -> Option<&EditBuffer> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.as_ref().map(|b| b.id.as_str()) == Some(id)
    }

    /// Enters Editing for `row`, seeding the buffer with its current fields.
    pub fn begin(&mut self, row: &Bookmark) {
        self.editing = Some(EditBuffer {
            id: row.id.clone(),
            title: row.title.clone(),
            url: row.url.clone(),
        });
    }

    /// Replaces the buffered draft values. No-op while Viewing.
    pub fn set_buffer(&mut self, title: &str, url: &str) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.title = title.to_string();
            buffer.url = url.to_string();
        }
    }

    /// Discards the buffer and returns to Viewing. No network call.
    pub fn cancel(&mut self) {
        self.editing = None;
    }

    /// Commits the buffered title/url for the edited row.
    ///
    /// On success the edited fields are merged into `list` and the row
    /// returns to Viewing; on failure it stays in Editing.
    pub async fn commit<S: BookmarkApiTrait>(
        &mut self,
        store: &S,
        list: &mut BookmarkListModel,
    ) -> CommitOutcome {
        let Some(buffer) = self.editing.clone() else {
            return CommitOutcome::NotEditing;
        };
        let patch = BookmarkPatch {
            title: Some(buffer.title.clone()),
            url: Some(buffer.url.clone()),
        };
        match store.update_bookmark(&buffer.id, patch).await {
            Ok(()) => {
                list.apply_patch(&buffer.id, &buffer.title, &buffer.url);
                self.editing = None;
                CommitOutcome::Committed
            }
            Err(e) => {
                tracing::warn!(error = %e, id = %buffer.id, "bookmark update failed; staying in edit mode");
                CommitOutcome::Failed
            }
        }
    }
}
