//! HTTP client for the dialog runtime's REST surface
//!
//! Sessions are addressed as
//! `{endpoint}/bots/{bot}/botAliases/{alias}/botLocales/{locale}/sessions/{session}`:
//! `POST {session}/text` submits an utterance, `DELETE {session}` discards
//! the runtime's state for it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::config::BotProfile;
use crate::session::SessionKey;

use super::normalize::RawRecognition;
use super::{DialogError, DialogService};

pub struct DialogRuntimeClient {
    client: Client,
    profile: BotProfile,
    api_key: Option<String>,
}

impl DialogRuntimeClient {
    pub fn new(profile: BotProfile) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        let api_key = profile
            .api_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok());

        Self {
            client,
            profile,
            api_key,
        }
    }

    fn session_url(&self, session: &SessionKey) -> String {
        format!(
            "{}/bots/{}/botAliases/{}/botLocales/{}/sessions/{}",
            self.profile.endpoint.trim_end_matches('/'),
            self.profile.bot_id,
            self.profile.bot_alias_id,
            self.profile.locale_id,
            session.as_str(),
        )
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }
}

#[async_trait]
impl DialogService for DialogRuntimeClient {
    async fn recognize(
        &self,
        session: &SessionKey,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<RawRecognition, DialogError> {
        let url = format!("{}/text", self.session_url(session));
        let request = self
            .authorize(self.client.post(&url))
            .json(&json!({ "text": text }));

        let round_trip = async {
            let response = request.send().await.map_err(from_reqwest)?;
            let status = response.status();
            let body = response.text().await.map_err(from_reqwest)?;
            Ok::<_, DialogError>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DialogError::Cancelled),
            result = round_trip => result?,
        };

        if !status.is_success() {
            tracing::debug!(%status, %body, "dialog runtime rejected the utterance");
            return Err(DialogError::ErrorStatus(status));
        }

        serde_json::from_str(&body)
            .map_err(|e| DialogError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    async fn discard_session(
        &self,
        session: &SessionKey,
        cancel: &CancellationToken,
    ) -> Result<(), DialogError> {
        let url = self.session_url(session);
        let request = self.authorize(self.client.delete(&url));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DialogError::Cancelled),
            result = request.send() => result.map_err(from_reqwest)?,
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "dialog runtime refused to discard the session");
            return Err(DialogError::ErrorStatus(status));
        }

        Ok(())
    }
}

fn from_reqwest(err: reqwest::Error) -> DialogError {
    if err.is_timeout() {
        DialogError::TimedOut
    } else {
        DialogError::RequestFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BotProfile {
        BotProfile {
            bot_id: "2RYOBPLM3Z".to_string(),
            bot_alias_id: "31MKW4FKL6".to_string(),
            locale_id: "en_US".to_string(),
            endpoint: "https://runtime.example.com/".to_string(),
            api_key_env: None,
            timeout_secs: 30,
        }
    }

    #[test]
    fn session_url_addresses_the_full_identity_tuple() {
        let client = DialogRuntimeClient::new(profile());
        let session = SessionKey::issue();
        let url = client.session_url(&session);
        assert_eq!(
            url,
            format!(
                "https://runtime.example.com/bots/2RYOBPLM3Z/botAliases/31MKW4FKL6/botLocales/en_US/sessions/{}",
                session.as_str()
            )
        );
    }

    #[tokio::test]
    async fn cancellation_aborts_before_the_round_trip_finishes() {
        // Reserved TEST-NET-1 address: the connect attempt stalls long
        // enough for the already-cancelled token to win the select.
        let mut profile = profile();
        profile.endpoint = "http://192.0.2.1".to_string();
        let client = DialogRuntimeClient::new(profile);
        let session = SessionKey::issue();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.recognize(&session, "hi", &cancel).await;
        assert!(matches!(result, Err(DialogError::Cancelled)));
    }
}
