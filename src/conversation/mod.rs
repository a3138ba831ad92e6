//! Conversation transcript types and state management
//!
//! The [`Transcript`] is the single source of truth for what a client
//! renders. It is append-only apart from one exception: regenerating the
//! most recent bot turn. A single-slot guard serializes send, regenerate,
//! and reset so only one exchange is ever outstanding.

use serde::{Deserialize, Serialize};

use crate::dialog::normalize::CanonicalResponse;

/// One conversational unit, immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub content: String,
    pub sender: Sender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("An exchange is already in flight")]
    Busy,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Nothing to regenerate")]
    NothingToRegenerate,
}

/// Handle for the exchange the transcript is waiting on.
///
/// Issued by [`Transcript::begin_send`] and [`Transcript::begin_regenerate`];
/// consumed by [`Transcript::complete`] or [`Transcript::fail`]. Carries the
/// utterance to submit upstream.
#[derive(Debug)]
pub struct PendingExchange {
    text: String,
}

impl PendingExchange {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered sequence of turns for one session.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    last_input: Option<String>,
    in_flight: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Whether an exchange is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Append the user's utterance and arm the in-flight guard.
    ///
    /// Rejects blank input locally and rejects any call while a previous
    /// exchange is still outstanding.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingExchange, TranscriptError> {
        if self.in_flight {
            return Err(TranscriptError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptError::EmptyInput);
        }

        self.turns.push(Turn {
            content: text.to_string(),
            sender: Sender::User,
        });
        self.last_input = Some(text.to_string());
        self.in_flight = true;

        Ok(PendingExchange {
            text: text.to_string(),
        })
    }

    /// Drop the trailing bot turn and prepare to resend the input that
    /// produced it.
    ///
    /// Only the most recent bot turn is ever removed; a trailing user turn
    /// is left alone. Repeated regeneration keeps targeting that single
    /// slot, so the transcript never ends up with two consecutive bot turns.
    pub fn begin_regenerate(&mut self) -> Result<PendingExchange, TranscriptError> {
        if self.in_flight {
            return Err(TranscriptError::Busy);
        }
        match self.turns.last() {
            Some(turn) if turn.sender == Sender::Bot => {}
            _ => return Err(TranscriptError::NothingToRegenerate),
        }
        let text = self
            .last_input
            .clone()
            .ok_or(TranscriptError::NothingToRegenerate)?;

        self.turns.pop();
        self.in_flight = true;

        Ok(PendingExchange { text })
    }

    /// Append the normalized reply as one bot turn and disarm the guard.
    ///
    /// Fragment contents are joined with a newline separator.
    pub fn complete(&mut self, pending: PendingExchange, reply: &CanonicalResponse) {
        drop(pending);
        self.turns.push(Turn {
            content: reply.joined(),
            sender: Sender::Bot,
        });
        self.in_flight = false;
    }

    /// Abandon the exchange, leaving the turns as they were.
    ///
    /// No bot turn is injected on a communication failure; the canned
    /// clarification reply only ever comes from normalizing a successful
    /// upstream response.
    pub fn fail(&mut self, pending: PendingExchange) {
        drop(pending);
        self.in_flight = false;
    }

    /// Truncate to empty.
    ///
    /// Callers invoke this only after the server acknowledged that the
    /// upstream session was discarded; a failed reset must leave the
    /// transcript intact.
    pub fn apply_reset(&mut self) {
        self.turns.clear();
        self.last_input = None;
        self.in_flight = false;
    }
}
