//! Unit tests for the dashboard view: guard wiring, live updates through the
//! change channel, subscription teardown, and the add/edit/delete walkthrough.

use std::time::Duration;

use cloudmark::remote::{BookmarkApiTrait, MemoryService};
use cloudmark::types::bookmark::NewBookmark;
use cloudmark::views::bookmark_list::{AddOutcome, LoadOutcome};
use cloudmark::views::dashboard::Dashboard;
use cloudmark::views::edit_controller::CommitOutcome;

fn signed_in_service() -> MemoryService {
    let service = MemoryService::new();
    service.sign_in_as("user-1", Some("user@example.com"));
    service
}

#[tokio::test]
async fn test_open_redirects_unauthenticated_visitor() {
    let service = MemoryService::new();
    assert!(Dashboard::open(&service).await.is_none());
}

#[tokio::test]
async fn test_open_loads_rows_and_subscribes() {
    let service = signed_in_service();
    service
        .insert_bookmark(NewBookmark {
            title: "Docs".to_string(),
            url: "https://example.com".to_string(),
            owner: "user-1".to_string(),
        })
        .await
        .unwrap();

    let dashboard = Dashboard::open(&service).await.expect("guard should pass");
    assert_eq!(dashboard.user.user_id, "user-1");
    assert_eq!(dashboard.user.email.as_deref(), Some("user@example.com"));
    assert_eq!(dashboard.list.items().len(), 1);
    assert!(dashboard.is_subscribed());
}

#[tokio::test]
async fn test_change_notification_triggers_reconciling_load() {
    let service = signed_in_service();
    let mut dashboard = Dashboard::open(&service).await.expect("guard should pass");

    // Another session writes to the same backend.
    let other = service.clone();
    other
        .insert_bookmark(NewBookmark {
            title: "From elsewhere".to_string(),
            url: "https://example.org".to_string(),
            owner: "user-2".to_string(),
        })
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), dashboard.next_change())
        .await
        .expect("a change event should arrive");
    assert_eq!(event.collection, "bookmarks");

    assert_eq!(dashboard.reconcile(&service).await, LoadOutcome::Refreshed);
    assert_eq!(dashboard.list.items().len(), 1);
    assert_eq!(dashboard.list.items()[0].title, "From elsewhere");
}

#[tokio::test]
async fn test_duplicate_notifications_reconcile_to_identical_lists() {
    let service = signed_in_service();
    let mut dashboard = Dashboard::open(&service).await.expect("guard should pass");

    service
        .insert_bookmark(NewBookmark {
            title: "Docs".to_string(),
            url: "https://example.com".to_string(),
            owner: "user-1".to_string(),
        })
        .await
        .unwrap();

    assert!(dashboard.drain_pending_changes());
    assert_eq!(dashboard.reconcile(&service).await, LoadOutcome::Refreshed);
    let snapshot = dashboard.list.items().to_vec();
    let version = dashboard.list.version();

    // A second notification for the same state re-fetches but changes nothing.
    assert_eq!(dashboard.reconcile(&service).await, LoadOutcome::Unchanged);
    assert_eq!(dashboard.list.items(), snapshot.as_slice());
    assert_eq!(dashboard.list.version(), version);
}

#[tokio::test]
async fn test_close_tears_down_the_subscription() {
    let service = signed_in_service();
    let mut dashboard = Dashboard::open(&service).await.expect("guard should pass");

    dashboard.close();
    assert!(!dashboard.is_subscribed());

    service
        .insert_bookmark(NewBookmark {
            title: "Unseen".to_string(),
            url: "https://example.com".to_string(),
            owner: "user-1".to_string(),
        })
        .await
        .unwrap();
    assert!(!dashboard.drain_pending_changes());
}

#[tokio::test]
async fn test_add_edit_delete_walkthrough() {
    let service = signed_in_service();
    let mut dashboard = Dashboard::open(&service).await.expect("guard should pass");

    // Add: the new bookmark shows up first with a generated id and timestamp.
    dashboard.list.set_draft("Docs", "https://example.com");
    let AddOutcome::Added(bookmark) = dashboard.list.add(&service).await else {
        panic!("expected the bookmark to be created");
    };
    assert_eq!(dashboard.list.items()[0].id, bookmark.id);
    assert!(!bookmark.id.is_empty());
    assert!(bookmark.created_at > 0);

    // Edit the title only: the url stays as it was.
    let row = dashboard.list.get(&bookmark.id).unwrap().clone();
    dashboard.edit.begin(&row);
    dashboard.edit.set_buffer("Docs v2", &row.url);
    let Dashboard { list, edit, .. } = &mut dashboard;
    assert_eq!(edit.commit(&service, list).await, CommitOutcome::Committed);
    let edited = dashboard.list.get(&bookmark.id).unwrap();
    assert_eq!(edited.title, "Docs v2");
    assert_eq!(edited.url, "https://example.com");

    // Delete: the id is gone locally and stays gone after reconciling.
    dashboard.list.remove(&service, &bookmark.id).await;
    assert!(dashboard.list.get(&bookmark.id).is_none());
    dashboard.reconcile(&service).await;
    assert!(dashboard.list.get(&bookmark.id).is_none());
}
