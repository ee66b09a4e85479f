use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;

/// One message in a conversation, in the shape stored on
/// `ai_conversations.messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `"user"` or `"assistant"`.
    pub role: String,
    pub content: String,
    pub timestamp: Option<String>,
}

/// Send a conversation to the configured provider and return the reply text.
///
/// # Errors
///
/// Returns an error if no provider is configured, the HTTP request fails, or
/// the response is malformed.
pub async fn chat(config: &Config, messages: &[ChatMessage]) -> anyhow::Result<String> {
    match config.ai_provider.as_str() {
        "anthropic" => anthropic_chat(config, messages).await,
        _ => openai_chat(config, messages).await,
    }
}

/// One-shot summarization of a block of text.
///
/// # Errors
///
/// Same failure modes as [`chat`].
pub async fn summarize(config: &Config, text: &str) -> anyhow::Result<String> {
    let messages = [ChatMessage {
        role: "user".to_string(),
        content: format!("Summarize the following concisely:\n\n{text}"),
        timestamp: None,
    }];
    chat(config, &messages).await
}

async fn openai_chat(config: &Config, messages: &[ChatMessage]) -> anyhow::Result<String> {
    if config.openai_api_key.is_empty() {
        return Err(anyhow::anyhow!("OPENAI_API_KEY is not configured"));
    }

    let payload = json!({
        "model": "gpt-4o-mini",
        "messages": messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect::<Vec<_>>(),
    });

    let resp = reqwest::Client::new()
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(&config.openai_api_key)
        .json(&payload)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("OpenAI request failed: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("OpenAI request failed ({status}): {body}"));
    }

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse OpenAI response: {e}"))?;

    body["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("OpenAI response missing message content"))
}

async fn anthropic_chat(config: &Config, messages: &[ChatMessage]) -> anyhow::Result<String> {
    if config.anthropic_api_key.is_empty() {
        return Err(anyhow::anyhow!("ANTHROPIC_API_KEY is not configured"));
    }

    let payload = json!({
        "model": "claude-sonnet-4-20250514",
        "max_tokens": 1024,
        "messages": messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect::<Vec<_>>(),
    });

    let resp = reqwest::Client::new()
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &config.anthropic_api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&payload)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Anthropic request failed: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "Anthropic request failed ({status}): {body}"
        ));
    }

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse Anthropic response: {e}"))?;

    body["content"][0]["text"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("Anthropic response missing text content"))
}
