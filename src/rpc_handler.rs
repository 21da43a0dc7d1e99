//! RPC method handler for the cloudmark stdio protocol.
//!
//! Kept separate from `rpc_server.rs` so it can be unit-tested against the
//! in-memory service. `handle_method` dispatches method calls to the router,
//! the views, and the remote service via the `App` struct.

use serde_json::{json, Value};

use crate::app::{App, Route};
use crate::remote::{AuthApiTrait, BookmarkApiTrait};
use crate::views::bookmark_list::{AddOutcome, LoadOutcome};
use crate::views::dashboard::Dashboard;
use crate::views::edit_controller::CommitOutcome;
use crate::views::entry::EntryView;

fn route_name(route: Route) -> &'static str {
    match route {
        Route::Entry => "entry",
        Route::Dashboard => "dashboard",
    }
}

fn parse_route(name: &str) -> Result<Route, String> {
    match name {
        "entry" => Ok(Route::Entry),
        "dashboard" => Ok(Route::Dashboard),
        other => Err(format!("unknown route: {}", other)),
    }
}

fn load_outcome_name(outcome: LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Refreshed => "refreshed",
        LoadOutcome::Unchanged => "unchanged",
        LoadOutcome::Failed => "failed",
    }
}

fn dashboard_required<R: AuthApiTrait + BookmarkApiTrait>(
    app: &mut App<R>,
) -> Result<&mut Dashboard, String> {
    app.dashboard_mut()
        .ok_or_else(|| "dashboard is not open".to_string())
}

/// Dispatches a method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method<R: AuthApiTrait + BookmarkApiTrait>(
    app: &mut App<R>,
    method: &str,
    params: &Value,
) -> Result<Value, String> {
    match method {
        // ─── Session & auth ───
        "session.get" => {
            let session = app
                .remote()
                .get_session()
                .await
                .map_err(|e| e.to_string())?;
            match session {
                Some(session) => Ok(json!({
                    "user_id": session.user.id,
                    "email": session.user.email,
                })),
                None => Ok(Value::Null),
            }
        }
        "auth.oauth_url" => {
            let defaults = app.login_defaults().clone();
            let provider = params
                .get("provider")
                .and_then(|v| v.as_str())
                .unwrap_or(&defaults.provider)
                .to_string();
            let redirect_to = params
                .get("redirect_to")
                .and_then(|v| v.as_str())
                .unwrap_or(&defaults.redirect_to)
                .to_string();
            let redirect = EntryView::login(app.remote(), &provider, &redirect_to)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({ "url": redirect.url }))
        }
        "auth.exchange" => {
            let code = params
                .get("code")
                .and_then(|v| v.as_str())
                .ok_or("missing code")?;
            let session = app
                .remote()
                .exchange_code(code)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "user_id": session.user.id,
                "email": session.user.email,
            }))
        }
        "auth.signout" => {
            app.sign_out().await;
            Ok(json!({ "ok": true, "route": route_name(app.route()) }))
        }

        // ─── Routing ───
        "route.open" => {
            let name = params
                .get("route")
                .and_then(|v| v.as_str())
                .ok_or("missing route")?;
            let landed = app.navigate(parse_route(name)?).await;
            Ok(json!({ "route": route_name(landed) }))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let dashboard = dashboard_required(app)?;
            let items = serde_json::to_value(dashboard.list.items())
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "version": dashboard.list.version(),
                "bookmarks": items,
            }))
        }
        "bookmark.reload" => {
            dashboard_required(app)?;
            let outcome = app.reload().await.ok_or("dashboard is not open")?;
            let version = app.dashboard().map(|d| d.list.version()).unwrap_or(0);
            Ok(json!({
                "outcome": load_outcome_name(outcome),
                "version": version,
            }))
        }
        "form.set" => {
            let title = params
                .get("title")
                .and_then(|v| v.as_str())
                .ok_or("missing title")?;
            let url = params
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or("missing url")?;
            let dashboard = dashboard_required(app)?;
            dashboard.list.set_draft(title, url);
            Ok(json!({ "ok": true }))
        }
        "bookmark.add" => {
            {
                let dashboard = dashboard_required(app)?;
                // Optional inline fields save the shell a form.set round trip.
                if let (Some(title), Some(url)) = (
                    params.get("title").and_then(|v| v.as_str()),
                    params.get("url").and_then(|v| v.as_str()),
                ) {
                    dashboard.list.set_draft(title, url);
                }
            }
            match app.add_bookmark().await.ok_or("dashboard is not open")? {
                AddOutcome::Added(bookmark) => Ok(json!({
                    "added": true,
                    "bookmark": serde_json::to_value(&bookmark).map_err(|e| e.to_string())?,
                })),
                AddOutcome::Rejected => Ok(json!({ "added": false, "reason": "empty_fields" })),
                AddOutcome::Failed => Ok(json!({ "added": false, "reason": "request_failed" })),
            }
        }
        "bookmark.remove" => {
            let id = params
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or("missing id")?
                .to_string();
            if !app.remove_bookmark(&id).await {
                return Err("dashboard is not open".to_string());
            }
            Ok(json!({ "ok": true }))
        }

        // ─── Row editing ───
        "edit.begin" => {
            let id = params
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or("missing id")?;
            let dashboard = dashboard_required(app)?;
            let row = dashboard
                .list
                .get(id)
                .cloned()
                .ok_or_else(|| format!("bookmark not found: {}", id))?;
            dashboard.edit.begin(&row);
            Ok(json!({ "ok": true, "title": row.title, "url": row.url }))
        }
        "edit.set" => {
            let title = params
                .get("title")
                .and_then(|v| v.as_str())
                .ok_or("missing title")?;
            let url = params
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or("missing url")?;
            let dashboard = dashboard_required(app)?;
            if dashboard.edit.editing().is_none() {
                return Err("no edit in progress".to_string());
            }
            dashboard.edit.set_buffer(title, url);
            Ok(json!({ "ok": true }))
        }
        "edit.commit" => {
            dashboard_required(app)?;
            let outcome = app.commit_edit().await.ok_or("dashboard is not open")?;
            let committed = match outcome {
                CommitOutcome::Committed => true,
                CommitOutcome::NotEditing => return Err("no edit in progress".to_string()),
                CommitOutcome::Failed => false,
            };
            Ok(json!({ "committed": committed }))
        }
        "edit.cancel" => {
            let dashboard = dashboard_required(app)?;
            dashboard.edit.cancel();
            Ok(json!({ "ok": true }))
        }

        // ─── Ping ───
        "ping" => Ok(json!({ "pong": true })),

        _ => Err(format!("unknown method: {}", method)),
    }
}
