//! Normalization of upstream recognition payloads
//!
//! The dialog runtime returns two materially different success shapes: a
//! top-level list of message objects, or a legacy fallback message buried in
//! the dialog-action structure (where `content` shows up both as a bare
//! string and as a sequence, depending on the upstream code path). Everything
//! downstream renders exactly one canonical shape, resolved here by a total
//! function. Missing or null fields at any depth resolve to the fallback
//! branch, never to an error.

use serde::{Deserialize, Deserializer, Serialize};

/// Canned reply used when the payload carries no usable content anywhere.
pub const CLARIFICATION_FALLBACK: &str =
    "I'm sorry, I didn't understand that — can you try again?";

/// One unit of bot output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
}

/// The only success shape the exchange engine ever returns: an ordered
/// sequence of content fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalResponse(Vec<Fragment>);

impl CanonicalResponse {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self(fragments)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.0
    }

    /// All fragment contents joined with a newline separator, the form a
    /// transcript stores as a single bot turn.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Older deployments returned `message` as a single string; coerce that into
// a one-element sequence instead of failing.
impl<'de> Deserialize<'de> for CanonicalResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Fragments(Vec<Fragment>),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Fragments(fragments) => Self(fragments),
            Wire::Text(text) => Self(vec![Fragment { content: text }]),
        })
    }
}

/// Raw recognition payload as the runtime sends it. Every field is optional;
/// shape selection happens in [`classify`], not during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecognition {
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,

    #[serde(default)]
    pub session_state: Option<RawSessionState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSessionState {
    #[serde(default)]
    pub dialog_action: Option<RawDialogAction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDialogAction {
    #[serde(default)]
    pub message: Option<RawFallbackMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFallbackMessage {
    #[serde(default)]
    pub content: Option<FallbackContent>,
}

/// The fallback `content` field appears both as a bare string and as a
/// sequence of message objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FallbackContent {
    Text(String),
    Fragments(Vec<RawMessage>),
}

/// The distinct shapes a successful recognition can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamShape {
    /// Non-empty top-level message list, used verbatim.
    List(Vec<Fragment>),
    /// Legacy message recovered from the dialog-action path.
    Fallback(Vec<Fragment>),
    /// Nothing usable anywhere in the payload.
    Empty,
}

/// Resolve a raw payload to its shape, in priority order: the top-level list
/// wins outright when non-empty, the dialog-action path is consulted next,
/// and anything else is [`UpstreamShape::Empty`].
pub fn classify(raw: &RawRecognition) -> UpstreamShape {
    if let Some(messages) = &raw.messages {
        if !messages.is_empty() {
            let fragments = messages
                .iter()
                .map(|m| Fragment {
                    content: m.content.clone().unwrap_or_default(),
                })
                .collect();
            return UpstreamShape::List(fragments);
        }
    }

    let fallback = raw
        .session_state
        .as_ref()
        .and_then(|s| s.dialog_action.as_ref())
        .and_then(|a| a.message.as_ref())
        .and_then(|m| m.content.as_ref());

    if let Some(content) = fallback {
        let fragments: Vec<Fragment> = match content {
            FallbackContent::Text(text) if !text.is_empty() => vec![Fragment {
                content: text.clone(),
            }],
            FallbackContent::Fragments(items) if !items.is_empty() => items
                .iter()
                .map(|m| Fragment {
                    content: m.content.clone().unwrap_or_default(),
                })
                .collect(),
            _ => Vec::new(),
        };
        if !fragments.is_empty() {
            return UpstreamShape::Fallback(fragments);
        }
    }

    UpstreamShape::Empty
}

/// Map any raw payload to the canonical sequence. Total: an empty shape
/// becomes the fixed clarification request rather than an error.
pub fn normalize(raw: &RawRecognition) -> CanonicalResponse {
    match classify(raw) {
        UpstreamShape::List(fragments) | UpstreamShape::Fallback(fragments) => {
            CanonicalResponse(fragments)
        }
        UpstreamShape::Empty => CanonicalResponse(vec![Fragment {
            content: CLARIFICATION_FALLBACK.to_string(),
        }]),
    }
}
