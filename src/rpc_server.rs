//! cloudmark RPC server — newline-delimited JSON over stdio for a UI shell.
//!
//! Protocol: one JSON object per line.
//! Request:  {"id":1, "method":"bookmark.add", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Unsolicited lines: {"event":"ready", ...} at startup, and
//! {"event":"change", ...} after a change notification has been reconciled
//! into the list. Diagnostics go to stderr; stdout carries the protocol.

use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use cloudmark::app::{App, LoginDefaults};
use cloudmark::remote::RestService;
use cloudmark::rpc_handler::handle_method;
use cloudmark::settings::Settings;
use cloudmark::views::bookmark_list::LoadOutcome;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("cloudmark-rpc: {}", e);
            std::process::exit(1);
        }
    };
    let login = LoginDefaults {
        provider: settings.oauth_provider.clone(),
        redirect_to: settings.redirect_to.clone(),
    };
    let remote = RestService::new(&settings);
    let mut app = App::new(remote, login);

    let mut stdout = io::stdout();
    emit(
        &mut stdout,
        json!({ "event": "ready", "version": env!("CARGO_PKG_VERSION") }),
    )
    .await;

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => {
                let line = match maybe_line {
                    Ok(Some(line)) => line,
                    _ => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                let request: Value = match serde_json::from_str(&line) {
                    Ok(value) => value,
                    Err(e) => {
                        emit(&mut stdout, json!({ "id": null, "error": format!("parse error: {}", e) })).await;
                        continue;
                    }
                };

                let id = request.get("id").cloned().unwrap_or(Value::Null);
                if !rate_limiter.check() {
                    emit(&mut stdout, json!({ "id": id, "error": "rate limit exceeded" })).await;
                    continue;
                }

                let method = request.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

                let response = match handle_method(&mut app, method, &params).await {
                    Ok(result) => json!({ "id": id, "result": result }),
                    Err(error) => json!({ "id": id, "error": error }),
                };
                emit(&mut stdout, response).await;
            }
            event = app.next_change() => {
                // Any notification triggers a whole-list re-fetch; only an
                // actual change in the list is worth telling the shell about.
                let outcome = app.reload().await;
                if matches!(outcome, Some(LoadOutcome::Refreshed)) {
                    let version = app.dashboard().map(|d| d.list.version()).unwrap_or(0);
                    emit(
                        &mut stdout,
                        json!({ "event": "change", "kind": event.kind, "version": version }),
                    )
                    .await;
                }
            }
        }
    }
}

async fn emit(stdout: &mut io::Stdout, value: Value) {
    let mut line = value.to_string();
    line.push('\n');
    if stdout.write_all(line.as_bytes()).await.is_err() {
        return;
    }
    let _ = stdout.flush().await;
}
