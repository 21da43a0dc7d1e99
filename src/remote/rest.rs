//! REST implementation of the remote data service.
//!
//! Speaks the hosted service's HTTP dialect: row CRUD under `/rest/v1`,
//! token grants under `/auth/v1`, and a streaming change feed under
//! `/realtime/v1`. The session is persisted as a JSON file in the data
//! directory so a signed-in user stays signed in across runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use tokio::sync::broadcast;
use zeroize::Zeroize;

use crate::remote::pkce;
use crate::remote::realtime::{self, Subscription};
use crate::remote::{AuthApiTrait, BookmarkApiTrait};
use crate::settings::Settings;
use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::change::ChangeEvent;
use crate::types::errors::{AuthError, FeedError, StoreError};
use crate::types::session::{AuthRedirect, AuthUser, Session};

/// Tokens expiring within this many seconds are treated as already expired.
const EXPIRY_LEEWAY_SECS: i64 = 30;
/// Delay before the change feed reconnects after the stream drops.
const FEED_RECONNECT_SECS: u64 = 3;
/// Cap on error-body text carried into error values.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the hosted data service.
pub struct RestService {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session_file: PathBuf,
    session: Mutex<Option<Session>>,
    pending_verifier: Mutex<Option<String>>,
}

impl RestService {
    /// Creates a new service client. A previously persisted session is
    /// picked up from the data directory, if one exists.
    pub fn new(settings: &Settings) -> Self {
        let session_file = settings.session_file();
        let session = load_session_file(&session_file);
        Self {
            http: reqwest::Client::new(),
            base_url: settings.service_url.clone(),
            anon_key: settings.anon_key.clone(),
            session_file,
            session: Mutex::new(session),
            pending_verifier: Mutex::new(None),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn rest_url(&self, query: &str) -> String {
        format!("{}/rest/v1/bookmarks{}", self.base_url, query)
    }

    fn auth_url(&self, path_and_query: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path_and_query)
    }

    fn current_session(&self) -> Option<Session> {
        match self.session.lock() {
            Ok(guard) => (*guard).clone(),
            Err(_) => None,
        }
    }

    /// Applies the service headers: the anon key, plus the session bearer
    /// token when one exists (the anon key doubles as the bearer otherwise).
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self
            .current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    fn store_session(&self, session: Session) {
        if let Some(parent) = self.session_file.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&session) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.session_file, json) {
                    tracing::warn!(error = %e, "failed to persist session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize session"),
        }
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session);
        }
    }

    fn clear_session(&self) {
        if let Ok(mut guard) = self.session.lock() {
            if let Some(mut session) = guard.take() {
                session.access_token.zeroize();
                session.refresh_token.zeroize();
            }
        }
        let _ = fs::remove_file(&self.session_file);
    }

    async fn token_grant(&self, grant_query: &str, body: String) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.auth_url(grant_query))
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::ApiError(status.as_u16(), truncate(&text)));
        }
        let grant: TokenGrant = serde_json::from_str(&text)
            .map_err(|e| AuthError::TokenDecode(e.to_string()))?;
        session_from_grant(grant)
    }
}

impl AuthApiTrait for RestService {
    /// An expired (or nearly expired) session gets one refresh attempt;
    /// after that, any failure collapses to "no session".
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if session.expires_at - EXPIRY_LEEWAY_SECS > Self::now() {
            return Ok(Some(session));
        }
        let body = serde_json::json!({ "refresh_token": session.refresh_token }).to_string();
        match self.token_grant("token?grant_type=refresh_token", body).await {
            Ok(fresh) => {
                self.store_session(fresh.clone());
                Ok(Some(fresh))
            }
            Err(e) => {
                tracing::debug!(error = %e, "session refresh failed; treating as signed out");
                self.clear_session();
                Ok(None)
            }
        }
    }

    async fn begin_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<AuthRedirect, AuthError> {
        let verifier = pkce::generate_verifier()?;
        let challenge = pkce::challenge_s256(&verifier);
        let mut url = format!(
            "{}?provider={}&code_challenge={}&code_challenge_method=s256",
            self.auth_url("authorize"),
            percent_encode(provider),
            challenge
        );
        if !redirect_to.is_empty() {
            url.push_str("&redirect_to=");
            url.push_str(&percent_encode(redirect_to));
        }
        if let Ok(mut guard) = self.pending_verifier.lock() {
            *guard = Some(verifier);
        }
        Ok(AuthRedirect { url })
    }

    async fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = match self.pending_verifier.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        }
        .ok_or(AuthError::NoPendingSignIn)?;
        let body =
            serde_json::json!({ "auth_code": code, "code_verifier": verifier }).to_string();
        let session = self.token_grant("token?grant_type=pkce", body).await?;
        self.store_session(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.current_session() {
            // Best-effort server-side revocation; local sign-out proceeds
            // whatever the endpoint answers.
            let result = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await;
            if let Err(e) = result {
                tracing::debug!(error = %e, "logout request failed");
            }
        }
        self.clear_session();
        Ok(())
    }
}

impl BookmarkApiTrait for RestService {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        let url = self.rest_url("?select=*&order=created_at.desc");
        let response = self
            .authed(self.http.get(url))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::ApiError(status.as_u16(), truncate(&text)));
        }
        serde_json::from_str(&text).map_err(|e| StoreError::DecodeError(e.to_string()))
    }

    async fn insert_bookmark(&self, row: NewBookmark) -> Result<Bookmark, StoreError> {
        let body =
            serde_json::to_string(&row).map_err(|e| StoreError::DecodeError(e.to_string()))?;
        let response = self
            .authed(self.http.post(self.rest_url("")))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::ApiError(status.as_u16(), truncate(&text)));
        }
        // The service answers an insert with the created rows as an array.
        let rows: Vec<Bookmark> =
            serde_json::from_str(&text).map_err(|e| StoreError::DecodeError(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::DecodeError("insert returned no row".to_string()))
    }

    async fn update_bookmark(&self, id: &str, patch: BookmarkPatch) -> Result<(), StoreError> {
        let body =
            serde_json::to_string(&patch).map_err(|e| StoreError::DecodeError(e.to_string()))?;
        let url = self.rest_url(&format!("?id=eq.{}", percent_encode(id)));
        let response = self
            .authed(self.http.patch(url))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::ApiError(status.as_u16(), truncate(&text)));
        }
        Ok(())
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        let url = self.rest_url(&format!("?id=eq.{}", percent_encode(id)));
        let response = self
            .authed(self.http.delete(url))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::ApiError(status.as_u16(), truncate(&text)));
        }
        Ok(())
    }

    /// Spawns a feed task streaming the collection's change events into the
    /// returned subscription. Dropping the subscription stops the task.
    async fn subscribe(&self) -> Result<Subscription, FeedError> {
        let (tx, rx) = realtime::channel();
        let http = self.http.clone();
        let url = format!(
            "{}/realtime/v1/changes?collection=bookmarks",
            self.base_url
        );
        let anon_key = self.anon_key.clone();
        let token = self
            .current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| anon_key.clone());
        let feed = tokio::spawn(run_feed(http, url, anon_key, token, tx));
        Ok(Subscription::new(rx, Some(feed)))
    }
}

/// Streams change events into `tx` until every subscriber is gone,
/// reconnecting after a short delay when the stream drops.
async fn run_feed(
    http: reqwest::Client,
    url: String,
    anon_key: String,
    token: String,
    tx: broadcast::Sender<ChangeEvent>,
) {
    loop {
        match open_stream(&http, &url, &anon_key, &token).await {
            Ok(mut response) => {
                let mut buffer = String::new();
                let mut events = Vec::new();
                loop {
                    match response.chunk().await {
                        Ok(Some(chunk)) => {
                            buffer.push_str(&String::from_utf8_lossy(&chunk));
                            realtime::drain_lines(&mut buffer, &mut events);
                            for event in events.drain(..) {
                                if tx.send(event).is_err() {
                                    return; // every receiver dropped
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "change stream read failed");
                            break;
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "change stream connect failed"),
        }
        if tx.receiver_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_secs(FEED_RECONNECT_SECS)).await;
    }
}

async fn open_stream(
    http: &reqwest::Client,
    url: &str,
    anon_key: &str,
    token: &str,
) -> Result<reqwest::Response, FeedError> {
    let response = http
        .get(url)
        .header("apikey", anon_key)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .map_err(|e| FeedError::ConnectFailed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(FeedError::ConnectFailed(format!(
            "status {}",
            response.status()
        )));
    }
    Ok(response)
}

/// Token-grant response shape shared by the PKCE and refresh grants.
#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Option<GrantUser>,
}

#[derive(Deserialize)]
struct GrantUser {
    id: String,
    email: Option<String>,
}

fn session_from_grant(grant: TokenGrant) -> Result<Session, AuthError> {
    let expires_at = grant
        .expires_at
        .unwrap_or_else(|| RestService::now() + grant.expires_in);
    let user = match grant.user {
        Some(user) => AuthUser {
            id: user.id,
            email: user.email,
        },
        None => {
            // Some grant responses omit the user object; the access token
            // payload carries the same identity.
            let claims = decode_claims(&grant.access_token)?;
            AuthUser {
                id: claims.sub,
                email: claims.email,
            }
        }
    };
    Ok(Session {
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        expires_at,
        user,
    })
}

/// Claims the client reads from an access token payload.
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    exp: i64,
}

/// Decodes the payload section of a JWT access token without verifying the
/// signature — verification is the service's job; the client only needs the
/// embedded identity.
fn decode_claims(token: &str) -> Result<AccessClaims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::TokenDecode("token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::TokenDecode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenDecode(e.to_string()))
}

fn load_session_file(path: &Path) -> Option<Session> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable session file");
            None
        }
    }
}

/// Percent-encodes a query-component value.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_LIMIT {
        trimmed.to_string()
    } else {
        let mut end = ERROR_BODY_LIMIT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    }
}
