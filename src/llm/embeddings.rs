use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Error;

const SERVICE: &str = "embedding service";

/// Maximum characters to send per document to the embedding API.
/// text-embedding-3-small has an 8 191-token context. Prose tokenises at
/// ~4 chars per token, so 20 000 chars ≈ 5 000 tokens, safely under the
/// limit even for unusually dense documents. We also pass `truncate: true`
/// to Ollama, but it has a known bug where it still returns 400 for inputs
/// that exceed the context length.
const MAX_EMBED_CHARS: usize = 20_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    // Find the last char boundary at or before the limit
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Embed one text with the configured provider, returning the raw vector.
/// One request per call; document-level fan-out and dimension checking live
/// in the index, not here.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, Error> {
    let text = truncate_for_embedding(text);
    match config.provider.as_str() {
        "ollama" => embed_ollama(client, config, text).await,
        "openai" => embed_openai(client, config, text).await,
        other => Err(Error::InvalidArgument(format!(
            "unknown LLM provider: {other}"
        ))),
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's
    /// context length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, Error> {
    let url = format!("{}/api/embed", config.base_url);

    let req = OllamaEmbedRequest {
        model: config.embedding_model.clone(),
        input: vec![text.to_string()],
        truncate: true,
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
            detail: format!("Ollama embed API returned {status}: {body}"),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;
    parse_ollama(&body)
}

fn parse_ollama(body: &str) -> Result<Vec<f32>, Error> {
    let parsed: OllamaEmbedResponse = serde_json::from_str(body).map_err(|e| Error::Upstream {
        service: SERVICE,
        detail: format!("unparseable Ollama embed response: {e}"),
    })?;
    parsed
        .embeddings
        .into_iter()
        .next()
        .ok_or_else(|| Error::Upstream {
            service: SERVICE,
            detail: "no embedding returned".to_string(),
        })
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, Error> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiEmbedRequest {
        model: config.embedding_model.clone(),
        input: vec![text.to_string()],
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
            detail: format!("OpenAI embed API returned {status}: {body}"),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_reqwest(SERVICE, e, config.request_timeout_secs))?;
    parse_openai(&body)
}

fn parse_openai(body: &str) -> Result<Vec<f32>, Error> {
    let parsed: OpenAiEmbedResponse = serde_json::from_str(body).map_err(|e| Error::Upstream {
        service: SERVICE,
        detail: format!("unparseable OpenAI embed response: {e}"),
    })?;
    parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| Error::Upstream {
            service: SERVICE,
            detail: "no embedding returned".to_string(),
        })
}
