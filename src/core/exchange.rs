//! Exchange engine bridging the HTTP boundary to the dialog runtime
//!
//! One request cycle runs recognize-then-normalize and is terminal: the
//! engine holds no state across requests. Conversational state lives
//! upstream, keyed by session. All upstream failure detail stops here —
//! clients only ever see the generic classification.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dialog::normalize::{normalize, CanonicalResponse};
use crate::dialog::DialogService;
use crate::session::SessionKey;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Any upstream communication failure. The message is what clients see.
    #[error("Error communicating with the dialog service")]
    Service,

    /// Upstream session disposal failed; the client must keep its transcript.
    #[error("Conversation reset did not take effect")]
    ResetFailed,
}

/// Result of a send. Blank input is ignored without an upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Replied(CanonicalResponse),
    Ignored,
}

pub struct ExchangeEngine {
    dialog: Arc<dyn DialogService>,
}

impl ExchangeEngine {
    pub fn new(dialog: Arc<dyn DialogService>) -> Self {
        Self { dialog }
    }

    /// Carry one utterance through recognize and normalize.
    pub async fn send(
        &self,
        session: &SessionKey,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ExchangeError> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(session = %session, "ignoring blank input");
            return Ok(Outcome::Ignored);
        }

        let raw = self
            .dialog
            .recognize(session, text, cancel)
            .await
            .map_err(|err| {
                tracing::error!(session = %session, error = %err, "recognition failed");
                ExchangeError::Service
            })?;

        Ok(Outcome::Replied(normalize(&raw)))
    }

    /// Dispose of the upstream session state. Success is the client's cue to
    /// truncate its transcript; failure means it must not.
    pub async fn reset(
        &self,
        session: &SessionKey,
        cancel: &CancellationToken,
    ) -> Result<(), ExchangeError> {
        self.dialog
            .discard_session(session, cancel)
            .await
            .map_err(|err| {
                tracing::error!(session = %session, error = %err, "session discard failed");
                ExchangeError::ResetFailed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Sender, Transcript};
    use crate::dialog::normalize::{RawRecognition, CLARIFICATION_FALLBACK};
    use crate::dialog::DialogError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves the same canned payload for every utterance.
    struct CannedDialog {
        payload: serde_json::Value,
        calls: AtomicUsize,
    }

    impl CannedDialog {
        fn new(payload: serde_json::Value) -> Self {
            Self {
                payload,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DialogService for CannedDialog {
        async fn recognize(
            &self,
            _session: &SessionKey,
            _text: &str,
            _cancel: &CancellationToken,
        ) -> Result<RawRecognition, DialogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(self.payload.clone()).unwrap())
        }

        async fn discard_session(
            &self,
            _session: &SessionKey,
            _cancel: &CancellationToken,
        ) -> Result<(), DialogError> {
            Ok(())
        }
    }

    /// Fails every call the way a dead transport would.
    struct UnreachableDialog;

    #[async_trait]
    impl DialogService for UnreachableDialog {
        async fn recognize(
            &self,
            _session: &SessionKey,
            _text: &str,
            _cancel: &CancellationToken,
        ) -> Result<RawRecognition, DialogError> {
            Err(DialogError::TimedOut)
        }

        async fn discard_session(
            &self,
            _session: &SessionKey,
            _cancel: &CancellationToken,
        ) -> Result<(), DialogError> {
            Err(DialogError::TimedOut)
        }
    }

    fn engine(dialog: Arc<dyn DialogService>) -> ExchangeEngine {
        ExchangeEngine::new(dialog)
    }

    async fn drive_send(
        engine: &ExchangeEngine,
        transcript: &mut Transcript,
        session: &SessionKey,
        text: &str,
    ) -> Result<(), ExchangeError> {
        let pending = transcript.begin_send(text).unwrap();
        let cancel = CancellationToken::new();
        match engine.send(session, pending.text(), &cancel).await {
            Ok(Outcome::Replied(reply)) => {
                transcript.complete(pending, &reply);
                Ok(())
            }
            Ok(Outcome::Ignored) => {
                transcript.fail(pending);
                Ok(())
            }
            Err(err) => {
                transcript.fail(pending);
                Err(err)
            }
        }
    }

    #[tokio::test]
    async fn greeting_renders_the_listed_message() {
        let dialog = Arc::new(CannedDialog::new(json!({
            "messages": [{ "content": "Welcome! What would you like to bake?" }]
        })));
        let engine = engine(dialog);
        let session = SessionKey::issue();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "hi")
            .await
            .unwrap();

        let last = transcript.turns().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.content, "Welcome! What would you like to bake?");
    }

    #[tokio::test]
    async fn dialog_action_fallback_renders_its_nested_content() {
        let dialog = Arc::new(CannedDialog::new(json!({
            "messages": [],
            "sessionState": {
                "dialogAction": {
                    "message": { "content": [{ "content": "Got it, banana bread it is!" }] }
                }
            }
        })));
        let engine = engine(dialog);
        let session = SessionKey::issue();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "banana bread")
            .await
            .unwrap();

        let last = transcript.turns().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.content, "Got it, banana bread it is!");
    }

    #[tokio::test]
    async fn empty_upstream_payload_renders_the_clarification_request() {
        let dialog = Arc::new(CannedDialog::new(json!({})));
        let engine = engine(dialog);
        let session = SessionKey::issue();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "mumble")
            .await
            .unwrap();

        let last = transcript.turns().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.content, CLARIFICATION_FALLBACK);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_the_envelope_and_adds_no_bot_turn() {
        let engine = engine(Arc::new(UnreachableDialog));
        let session = SessionKey::issue();
        let mut transcript = Transcript::new();

        let result = drive_send(&engine, &mut transcript, &session, "hi").await;
        assert!(matches!(result, Err(ExchangeError::Service)));

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].sender, Sender::User);
        assert!(!transcript.is_busy());
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_runtime() {
        let dialog = Arc::new(CannedDialog::new(json!({})));
        let engine = ExchangeEngine::new(dialog.clone());
        let session = SessionKey::issue();
        let cancel = CancellationToken::new();

        let outcome = engine.send(&session, "   ", &cancel).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(dialog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_success_acks_the_truncation() {
        let dialog = Arc::new(CannedDialog::new(json!({
            "messages": [{ "content": "Welcome!" }]
        })));
        let engine = ExchangeEngine::new(dialog);
        let session = SessionKey::issue();
        let cancel = CancellationToken::new();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "hi")
            .await
            .unwrap();

        engine.reset(&session, &cancel).await.unwrap();
        transcript.apply_reset();
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn reset_failure_preserves_the_transcript() {
        let canned = Arc::new(CannedDialog::new(json!({
            "messages": [{ "content": "Welcome!" }]
        })));
        let engine = ExchangeEngine::new(canned);
        let session = SessionKey::issue();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "hi")
            .await
            .unwrap();
        let len_before = transcript.len();

        let failing = ExchangeEngine::new(Arc::new(UnreachableDialog));
        let cancel = CancellationToken::new();
        let result = failing.reset(&session, &cancel).await;
        assert!(matches!(result, Err(ExchangeError::ResetFailed)));

        // No ack, so the client never truncates.
        assert_eq!(transcript.len(), len_before);
    }

    #[tokio::test]
    async fn regenerate_resends_the_original_input() {
        let dialog = Arc::new(CannedDialog::new(json!({
            "messages": [{ "content": "A fine loaf." }]
        })));
        let engine = ExchangeEngine::new(dialog.clone());
        let session = SessionKey::issue();
        let cancel = CancellationToken::new();
        let mut transcript = Transcript::new();

        drive_send(&engine, &mut transcript, &session, "banana bread")
            .await
            .unwrap();
        let len_before = transcript.len();

        let pending = transcript.begin_regenerate().unwrap();
        assert_eq!(pending.text(), "banana bread");
        match engine.send(&session, pending.text(), &cancel).await.unwrap() {
            Outcome::Replied(reply) => transcript.complete(pending, &reply),
            Outcome::Ignored => unreachable!("input was non-empty"),
        }

        assert_eq!(transcript.len(), len_before);
        assert_eq!(dialog.calls.load(Ordering::SeqCst), 2);
    }
}
