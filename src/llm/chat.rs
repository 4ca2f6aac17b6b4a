use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Error;

const SERVICE: &str = "completion service";

/// One completion call: a system persona, the user content, and the
/// sampling knobs the synthesizer fixes per answer mode.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Request a single non-streaming completion from the configured provider.
pub async fn complete(
    client: &reqwest::Client,
    config: &LlmConfig,
    request: &CompletionRequest<'_>,
) -> Result<String, Error> {
    match config.provider.as_str() {
        "ollama" => complete_ollama(client, config, request).await,
        "openai" => complete_openai(client, config, request).await,
        other => Err(Error::InvalidArgument(format!(
            "unknown LLM provider: {other}"
        ))),
    }
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

fn build_messages(request: &CompletionRequest<'_>) -> Vec<Message> {
    vec![
        Message {
            role: "system".to_string(),
            content: request.system.to_string(),
        },
        Message {
            role: "user".to_string(),
            content: request.user.to_string(),
        },
    ]
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options; `num_predict` is Ollama's output-token cap.
#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn complete_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    request: &CompletionRequest<'_>,
) -> Result<String, Error> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: build_messages(request),
        stream: false,
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Upstream {
            service: SERVICE,
            detail: format!("Ollama chat API returned {status}: {body}"),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;
    parse_ollama(&body)
}

fn parse_ollama(body: &str) -> Result<String, Error> {
    let parsed: OllamaChatResponse = serde_json::from_str(body).map_err(|e| Error::Upstream {
        service: SERVICE,
        detail: format!("unparseable Ollama chat response: {e}"),
    })?;
    Ok(parsed.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

async fn complete_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    request: &CompletionRequest<'_>,
) -> Result<String, Error> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: build_messages(request),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Upstream {
            service: SERVICE,
            detail: format!("OpenAI chat API returned {status}: {body}"),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;
    parse_openai(&body)
}

fn parse_openai(body: &str) -> Result<String, Error> {
    let parsed: OpenAiChatResponse = serde_json::from_str(body).map_err(|e| Error::Upstream {
        service: SERVICE,
        detail: format!("unparseable OpenAI chat response: {e}"),
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| Error::Upstream {
            service: SERVICE,
            detail: "no completion choices returned".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Launchpool lets you stake."}}]}"#;
        assert_eq!(parse_openai(body).unwrap(), "Launchpool lets you stake.");
    }

    #[test]
    fn test_parse_openai_no_choices() {
        let err = parse_openai(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.code(), "upstream_error");
    }

    #[test]
    fn test_parse_openai_malformed() {
        let err = parse_openai("data: {broken").unwrap_err();
        assert_eq!(err.code(), "upstream_error");
    }

    #[test]
    fn test_parse_ollama_completion() {
        let body = r#"{"message":{"role":"assistant","content":"Staking locks tokens."}}"#;
        assert_eq!(parse_ollama(body).unwrap(), "Staking locks tokens.");
    }

    #[test]
    fn test_messages_carry_system_then_user() {
        let request = CompletionRequest {
            system: "You are helpful.",
            user: "What is staking?",
            temperature: 0.7,
            max_tokens: 150,
        };
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "What is staking?");
    }
}
