use crate::core::error::{MarketError, Result};
use crate::providers::util::{RequestProfile, RetryPolicy, post_form_reply};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// The Bot API envelope returned by `sendMessage`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TelegramReply {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sends plain-text messages to one chat through the Telegram Bot API.
pub struct TelegramNotifier {
    base_url: String,
    bot_token: String,
    chat_id: String,
    client: Client,
    profile: RequestProfile,
}

impl TelegramNotifier {
    pub fn new(base_url: &str, bot_token: &str, chat_id: &str, client: Client) -> Result<Self> {
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(MarketError::InvalidInput(
                "Telegram bot token and chat id are required".to_string(),
            ));
        }
        Ok(TelegramNotifier {
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            client,
            profile: RequestProfile::plain(),
        })
    }

    /// Not retried: a timed-out send may still have been delivered.
    ///
    /// The Bot API answers rejected sends with a 4xx status and an `ok: false`
    /// body; its `description` ends up in the returned `Schema` error.
    #[instrument(name = "TelegramSend", skip_all, fields(chat_id = %self.chat_id))]
    pub async fn send_message(&self, text: &str) -> Result<TelegramReply> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let raw = post_form_reply(
            &self.client,
            &url,
            &self.profile,
            &RetryPolicy::single(),
            &[("chat_id", self.chat_id.as_str()), ("text", text)],
        )
        .await
        .map_err(|e| redact(e, &self.bot_token))?;

        let reply: TelegramReply = serde_json::from_value(raw)
            .map_err(|e| MarketError::Schema(format!("Telegram reply: {e}")))?;
        if !reply.ok {
            return Err(MarketError::Schema(format!(
                "Telegram rejected the message: {}",
                reply.description.as_deref().unwrap_or("no description")
            )));
        }
        debug!("Telegram message delivered");
        Ok(reply)
    }
}

/// Keeps the bot token out of error messages.
fn redact(err: MarketError, token: &str) -> MarketError {
    match err {
        MarketError::Network { url, reason } => MarketError::Network {
            url: url.replace(token, "<token>"),
            reason: reason.replace(token, "<token>"),
        },
        MarketError::Decode { url, source } => MarketError::Decode {
            url: url.replace(token, "<token>"),
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_message_posts_form() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .and(body_string_contains("chat_id=42"))
            .and(body_string_contains("text=KOSPI+down"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok": true, "result": {"message_id": 7, "text": "KOSPI down"}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::new(&mock_server.uri(), "123:ABC", "42", Client::new()).unwrap();
        let reply = notifier.send_message("KOSPI down").await.unwrap();
        assert!(reply.ok);
    }

    #[tokio::test]
    async fn test_rejected_message_is_schema_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#,
            ))
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::new(&mock_server.uri(), "123:ABC", "42", Client::new()).unwrap();
        let err = notifier.send_message("hello").await.unwrap_err();
        assert!(matches!(err, MarketError::Schema(_)));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_bad_request_keeps_description() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::new(&mock_server.uri(), "123:ABC", "42", Client::new()).unwrap();
        let err = notifier.send_message("hello").await.unwrap_err();
        assert!(matches!(err, MarketError::Schema(_)));
        assert!(err.to_string().contains("Bad Request: chat not found"));
        assert!(!err.to_string().contains("123:ABC"));
    }

    #[tokio::test]
    async fn test_unauthorized_without_json_body_is_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::new(&mock_server.uri(), "123:SECRET", "42", Client::new()).unwrap();
        let err = notifier.send_message("hello").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 401 Unauthorized"));
        assert!(!err.to_string().contains("SECRET"));
    }

    #[tokio::test]
    async fn test_server_error_is_sent_once_and_redacted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::new(&mock_server.uri(), "123:SECRET", "42", Client::new()).unwrap();
        let err = notifier.send_message("hello").await.unwrap_err();
        assert!(matches!(err, MarketError::Network { .. }));
        assert!(!err.to_string().contains("SECRET"));
    }

    #[test]
    fn test_missing_credentials() {
        assert!(TelegramNotifier::new("https://api.telegram.org", "", "42", Client::new()).is_err());
    }
}
