//! Dialog runtime integration
//!
//! The runtime holds all conversational state, keyed by session; this
//! process stays stateless between requests. Everything the relay knows
//! about the upstream service goes through [`DialogService`].

pub mod normalize;

mod runtime;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::session::SessionKey;

use normalize::RawRecognition;

pub use runtime::DialogRuntimeClient;

/// Failures crossing the upstream boundary. Variants carry enough detail for
/// server-side logs; the exchange engine collapses all of them into one
/// generic classification before anything reaches a client.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service returned {0}")]
    ErrorStatus(reqwest::StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    TimedOut,

    #[error("Request cancelled")]
    Cancelled,
}

/// Boundary to the managed dialog-understanding service.
#[async_trait]
pub trait DialogService: Send + Sync {
    /// Submit one utterance and return the raw recognition payload.
    ///
    /// `text` is non-empty at this layer; the exchange engine rejects blank
    /// input before any upstream call is made.
    async fn recognize(
        &self,
        session: &SessionKey,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<RawRecognition, DialogError>;

    /// Discard the conversational state the runtime holds for `session`.
    async fn discard_session(
        &self,
        session: &SessionKey,
        cancel: &CancellationToken,
    ) -> Result<(), DialogError>;
}
