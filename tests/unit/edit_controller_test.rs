//! Unit tests for the per-row edit controller: the Viewing/Editing machine,
//! the single shared edit target, and commit/cancel semantics.

use cloudmark::remote::{BookmarkApiTrait, MemoryService};
use cloudmark::types::bookmark::NewBookmark;
use cloudmark::views::bookmark_list::BookmarkListModel;
use cloudmark::views::edit_controller::{CommitOutcome, EditController};

async fn seeded(titles: &[&str]) -> (MemoryService, BookmarkListModel, Vec<String>) {
    let service = MemoryService::new();
    let mut ids = Vec::new();
    for title in titles {
        let row = service
            .insert_bookmark(NewBookmark {
                title: title.to_string(),
                url: format!("https://example.com/{}", title.to_lowercase()),
                owner: "user-1".to_string(),
            })
            .await
            .expect("insert should succeed");
        ids.push(row.id);
    }
    let mut list = BookmarkListModel::new("user-1");
    list.load(&service).await;
    (service, list, ids)
}

#[tokio::test]
async fn test_begin_seeds_buffer_from_row() {
    let (_service, list, ids) = seeded(&["Docs"]).await;
    let mut edit = EditController::new();

    edit.begin(list.get(&ids[0]).unwrap());
    let buffer = edit.editing().unwrap();
    assert_eq!(buffer.id, ids[0]);
    assert_eq!(buffer.title, "Docs");
    assert_eq!(buffer.url, "https://example.com/docs");
    assert!(edit.is_editing(&ids[0]));
}

#[tokio::test]
async fn test_only_one_row_is_editable_at_a_time() {
    let (_service, list, ids) = seeded(&["First", "Second"]).await;
    let mut edit = EditController::new();

    edit.begin(list.get(&ids[0]).unwrap());
    edit.begin(list.get(&ids[1]).unwrap());

    assert!(!edit.is_editing(&ids[0]));
    assert!(edit.is_editing(&ids[1]));
    assert_eq!(edit.editing().unwrap().title, "Second");
}

#[tokio::test]
async fn test_set_buffer_is_a_noop_while_viewing() {
    let mut edit = EditController::new();
    edit.set_buffer("Title", "https://example.com");
    assert!(edit.editing().is_none());
}

#[tokio::test]
async fn test_cancel_discards_buffer_without_network_call() {
    let (service, mut list, ids) = seeded(&["Docs"]).await;
    let mut edit = EditController::new();

    edit.begin(list.get(&ids[0]).unwrap());
    edit.set_buffer("Scratch", "https://scratch.example");
    edit.cancel();

    assert!(edit.editing().is_none());
    list.load(&service).await;
    assert_eq!(list.get(&ids[0]).unwrap().title, "Docs");
}

#[tokio::test]
async fn test_commit_updates_server_and_mirrors_into_list() {
    let (service, mut list, ids) = seeded(&["Docs"]).await;
    let mut edit = EditController::new();

    edit.begin(list.get(&ids[0]).unwrap());
    edit.set_buffer("Docs v2", "https://example.com/v2");
    assert_eq!(
        edit.commit(&service, &mut list).await,
        CommitOutcome::Committed
    );
    assert!(edit.editing().is_none());

    let local = list.get(&ids[0]).unwrap();
    assert_eq!(local.title, "Docs v2");
    assert_eq!(local.url, "https://example.com/v2");

    let server = service.server_rows();
    assert_eq!(server[0].title, "Docs v2");
    assert_eq!(server[0].url, "https://example.com/v2");
}

#[tokio::test]
async fn test_failed_commit_stays_in_edit_mode() {
    let (service, mut list, ids) = seeded(&["Docs"]).await;
    let mut edit = EditController::new();

    edit.begin(list.get(&ids[0]).unwrap());
    edit.set_buffer("Docs v2", "https://example.com/v2");
    service.set_fail_writes(true);

    assert_eq!(edit.commit(&service, &mut list).await, CommitOutcome::Failed);
    assert!(edit.is_editing(&ids[0]));
    assert_eq!(edit.editing().unwrap().title, "Docs v2");
    assert_eq!(list.get(&ids[0]).unwrap().title, "Docs");
}

#[tokio::test]
async fn test_commit_without_edit_in_progress() {
    let (service, mut list, _ids) = seeded(&["Docs"]).await;
    let mut edit = EditController::new();
    assert_eq!(
        edit.commit(&service, &mut list).await,
        CommitOutcome::NotEditing
    );
}
