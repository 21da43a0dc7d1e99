use serde::{Deserialize, Serialize};

/// A saved bookmark row as the data service returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub owner: String,
    pub created_at: i64,
}

/// Payload for creating a bookmark. The service assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub owner: String,
}

/// Partial update for a bookmark. `None` fields are left out of the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
