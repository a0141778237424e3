use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::CompletionBackend;
use crate::error::AgentError;

const API_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Clone)]
pub struct AnthropicClient {
    pub base_url: String,
    pub api_key: String,
    model: String,
    max_tokens: u32,
    http_client: HttpClient,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Result<Self, AgentError> {
        let http_client = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: API_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            http_client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesResponse {
    fn into_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
    }
}

#[async_trait]
impl CompletionBackend for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Api(format!(
                "Anthropic API call failed: {status} - {text}"
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        match parsed.into_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AgentError::Api("empty completion payload".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_block() {
        let payload = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "BTC consolidating near resistance."}
            ],
            "model": "claude-3-5-sonnet-20241022",
            "stop_reason": "end_turn"
        }"#;

        let parsed: MessagesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(
            parsed.into_text().unwrap(),
            "BTC consolidating near resistance."
        );
    }

    #[test]
    fn missing_text_block_yields_none() {
        let payload = r#"{"content": [{"type": "tool_use"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.into_text(), None);
    }

    fn client_against(server: &mockito::Server) -> AnthropicClient {
        let mut client =
            AnthropicClient::new("test-key", "claude-3-5-sonnet-20241022", 1500).unwrap();
        client.base_url = server.url();
        client
    }

    #[tokio::test]
    async fn completes_against_messages_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content": [{"type": "text", "text": "ETH leading on relative strength."}]}"#,
            )
            .create_async()
            .await;

        let text = client_against(&server).complete("prompt").await.unwrap();
        assert_eq!(text, "ETH leading on relative strength.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type": "error", "error": {"type": "overloaded_error"}}"#)
            .create_async()
            .await;

        let result = client_against(&server).complete("prompt").await;
        match result {
            Err(AgentError::Api(msg)) => assert!(msg.contains("529")),
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn blank_completion_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "   "}]}"#)
            .create_async()
            .await;

        let result = client_against(&server).complete("prompt").await;
        assert!(matches!(result, Err(AgentError::Api(_))));
    }
}
