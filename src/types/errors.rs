use std::fmt;

// === SettingsError ===

/// Errors related to application settings.
#[derive(Debug)]
pub enum SettingsError {
    /// A required setting is missing (names the env var or field).
    MissingValue(String),
    /// The service URL is not an http(s) URL.
    InvalidUrl(String),
    /// An I/O error occurred while reading the settings file.
    IoError(String),
    /// Failed to parse the settings file.
    SerializationError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::MissingValue(name) => write!(f, "Missing setting: {}", name),
            SettingsError::InvalidUrl(url) => write!(f, "Invalid service URL: {}", url),
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === AuthError ===

/// Errors related to authentication against the data service.
#[derive(Debug)]
pub enum AuthError {
    /// No sign-in is in progress for the attempted code exchange.
    NoPendingSignIn,
    /// The OAuth flow could not be prepared.
    OAuthFlow(String),
    /// The access token payload could not be decoded.
    TokenDecode(String),
    /// A network error occurred while talking to the auth endpoints.
    NetworkError(String),
    /// The auth endpoint answered with a non-success status.
    ApiError(u16, String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NoPendingSignIn => write!(f, "No sign-in in progress"),
            AuthError::OAuthFlow(msg) => write!(f, "OAuth flow error: {}", msg),
            AuthError::TokenDecode(msg) => write!(f, "Token decode error: {}", msg),
            AuthError::NetworkError(msg) => write!(f, "Auth network error: {}", msg),
            AuthError::ApiError(status, msg) => {
                write!(f, "Auth API error (status {}): {}", status, msg)
            }
        }
    }
}

impl std::error::Error for AuthError {}

// === StoreError ===

/// Errors related to row operations on the bookmarks collection.
#[derive(Debug)]
pub enum StoreError {
    /// A network error occurred while talking to the collection endpoints.
    NetworkError(String),
    /// The collection endpoint answered with a non-success status.
    ApiError(u16, String),
    /// The response body could not be decoded into rows.
    DecodeError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NetworkError(msg) => write!(f, "Store network error: {}", msg),
            StoreError::ApiError(status, msg) => {
                write!(f, "Store API error (status {}): {}", status, msg)
            }
            StoreError::DecodeError(msg) => write!(f, "Store decode error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === FeedError ===

/// Errors related to the change-notification feed.
#[derive(Debug)]
pub enum FeedError {
    /// The feed stream could not be opened.
    ConnectFailed(String),
    /// The feed channel is closed and will deliver no further events.
    Closed,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::ConnectFailed(msg) => write!(f, "Change feed connect failed: {}", msg),
            FeedError::Closed => write!(f, "Change feed closed"),
        }
    }
}

impl std::error::Error for FeedError {}
