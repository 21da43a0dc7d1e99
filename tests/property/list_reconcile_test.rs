//! Property-based tests for bookmark list reconciliation.
//!
//! The reconciling load is the single authority over local state: whatever
//! mix of optimistic adds, optimistic removes, and re-fetches happened, the
//! list must converge to the server's rows with no duplicates, and repeating
//! the load must change nothing.

use cloudmark::remote::{BookmarkApiTrait, MemoryService};
use cloudmark::types::bookmark::NewBookmark;
use cloudmark::views::bookmark_list::{AddOutcome, BookmarkListModel, LoadOutcome};
use proptest::prelude::*;
use std::collections::HashSet;

/// Strategy for generating valid URL strings.
fn arb_url() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("https"), Just("http")],
        "[a-z][a-z0-9]{2,15}",
        prop_oneof![Just(".com"), Just(".org"), Just(".net"), Just(".io")],
        proptest::option::of("/[a-z0-9]{1,10}"),
    )
        .prop_map(|(scheme, host, tld, path)| {
            format!("{}://{}{}{}", scheme, host, tld, path.unwrap_or_default())
        })
}

/// Strategy for generating non-empty bookmark titles.
fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{1,30}"
}

/// One user action against the list.
#[derive(Debug, Clone)]
enum Op {
    Add(String, String),
    RemoveNth(usize),
    Reload,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_title(), arb_url()).prop_map(|(t, u)| Op::Add(t, u)),
        (0..8usize).prop_map(Op::RemoveNth),
        Just(Op::Reload),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // *For any* valid title and url, adding a bookmark and then loading
    // SHALL yield a list whose head is the added bookmark.
    #[test]
    fn add_then_load_puts_the_new_bookmark_first(
        title in arb_title(),
        url in arb_url(),
        seed_rows in proptest::collection::vec((arb_title(), arb_url()), 0..4),
    ) {
        let (head, added) = runtime().block_on(async {
            let service = MemoryService::new();
            for (t, u) in seed_rows {
                service
                    .insert_bookmark(NewBookmark { title: t, url: u, owner: "user-1".to_string() })
                    .await
                    .expect("seed insert should succeed");
            }

            let mut list = BookmarkListModel::new("user-1");
            list.load(&service).await;
            list.set_draft(&title, &url);
            let AddOutcome::Added(added) = list.add(&service).await else {
                panic!("add should succeed for valid inputs");
            };
            list.load(&service).await;
            (list.items()[0].clone(), added)
        });

        prop_assert_eq!(&head.id, &added.id);
        prop_assert_eq!(&head.title, &title);
        prop_assert_eq!(&head.url, &url);
    }

    // *For any* sequence of adds, optimistic removes, and reloads, a final
    // load converges local state onto the server rows, with unique ids, and
    // a second load is a no-op.
    #[test]
    fn any_op_sequence_converges_on_reload(ops in proptest::collection::vec(arb_op(), 1..12)) {
        let (local, server, second_load, version_before, version_after) =
            runtime().block_on(async {
                let service = MemoryService::new();
                let mut list = BookmarkListModel::new("user-1");

                for op in ops {
                    match op {
                        Op::Add(title, url) => {
                            list.set_draft(&title, &url);
                            list.add(&service).await;
                        }
                        Op::RemoveNth(n) => {
                            let id = list.items().get(n % list.items().len().max(1))
                                .map(|b| b.id.clone());
                            if let Some(id) = id {
                                list.remove(&service, &id).await;
                            }
                        }
                        Op::Reload => {
                            list.load(&service).await;
                        }
                    }
                }

                list.load(&service).await;
                let version_before = list.version();
                let local = list.items().to_vec();
                let second_load = list.load(&service).await;
                (local, service.server_rows(), second_load, version_before, list.version())
            });

        prop_assert_eq!(&local, &server);
        let ids: HashSet<&str> = local.iter().map(|b| b.id.as_str()).collect();
        prop_assert_eq!(ids.len(), local.len());
        prop_assert_eq!(second_load, LoadOutcome::Unchanged);
        prop_assert_eq!(version_before, version_after);
    }

    // Receiving two notifications in a row re-runs the load twice; the
    // second pass must leave an identical list behind.
    #[test]
    fn double_load_is_idempotent(rows in proptest::collection::vec((arb_title(), arb_url()), 0..6)) {
        let (first, second, unchanged) = runtime().block_on(async {
            let service = MemoryService::new();
            for (t, u) in rows {
                service
                    .insert_bookmark(NewBookmark { title: t, url: u, owner: "user-1".to_string() })
                    .await
                    .expect("insert should succeed");
            }

            let mut list = BookmarkListModel::new("user-1");
            list.load(&service).await;
            let first = list.items().to_vec();
            let outcome = list.load(&service).await;
            (first, list.items().to_vec(), outcome)
        });

        prop_assert_eq!(first, second);
        prop_assert_eq!(unchanged, LoadOutcome::Unchanged);
    }
}
