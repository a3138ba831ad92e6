//! Explicit session identity
//!
//! Correlation with the dialog runtime's per-session state uses an opaque
//! token issued here and replayed by the client on every request, carried in
//! a dedicated header. Nothing is derived from the connection's network
//! address, so clients behind a shared address never collide.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the session token in both directions.
pub const SESSION_HEADER: &str = "x-bakebot-session";

/// Opaque, non-empty correlation key for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    /// Issue a fresh key. Infallible, and collision-free across
    /// concurrently active clients.
    pub fn issue() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the key a request carried, or issue a new one.
    ///
    /// Anything unusable in the header (absent, blank, non-UTF8) yields a
    /// fresh key rather than an error.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .unwrap_or_else(Self::issue)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
