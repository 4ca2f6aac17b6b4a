use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for plain-text documents
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Optional filename prefix selecting a sub-topic of the corpus
    /// (e.g. "launchpool" loads only `launchpool*.txt`)
    pub doc_filter: Option<String>,
    /// Subject the corpus covers; interpolated into prompt templates
    pub topic: String,
    /// How many documents to retrieve as context per question
    pub top_k: usize,
    /// Prompt template for grounded answers
    pub answer_style: AnswerStyle,
    /// Maximum embedding requests in flight during startup indexing
    pub max_concurrent_embeds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer synthesis
    pub chat_model: String,
    /// Model name for embeddings; must stay constant for the process
    /// lifetime (the index refuses a mid-flight model swap)
    pub embedding_model: String,
    /// API key (required for the openai provider)
    pub api_key: Option<String>,
    /// Expected embedding vector dimension. Unset, the first embedding
    /// response locks the dimension; set, the first response is checked
    /// against it.
    pub embedding_dim: Option<usize>,
    /// Per-request timeout for provider calls, in seconds
    pub request_timeout_secs: u64,
}

/// Shape of the grounded answer requested from the completion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStyle {
    /// Two simple beginner-friendly sentences, 150-token budget
    Concise,
    /// Comprehensive answer, 500-token budget
    Detailed,
}

impl AnswerStyle {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "concise" => Some(AnswerStyle::Concise),
            "detailed" => Some(AnswerStyle::Detailed),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            llm: LlmConfig::default(),
            doc_filter: None,
            topic: "Binance".to_string(),
            top_k: 3,
            answer_style: AnswerStyle::Concise,
            max_concurrent_embeds: 4,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: None,
            embedding_dim: None,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    /// Fails when the configured provider needs a credential and none is
    /// present: a missing key is a startup condition, not a per-request
    /// error.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("EXCHANGE_IQ_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("EXCHANGE_IQ_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(filter) = std::env::var("EXCHANGE_IQ_DOC_FILTER") {
            if !filter.trim().is_empty() {
                config.doc_filter = Some(filter);
            }
        }
        if let Ok(topic) = std::env::var("EXCHANGE_IQ_TOPIC") {
            if !topic.trim().is_empty() {
                config.topic = topic;
            }
        }
        if let Ok(val) = std::env::var("EXCHANGE_IQ_TOP_K") {
            if let Ok(v) = val.parse() {
                config.top_k = v;
            }
        }
        if let Ok(style) = std::env::var("EXCHANGE_IQ_ANSWER_STYLE") {
            if let Some(parsed) = AnswerStyle::parse(&style) {
                config.answer_style = parsed;
            }
        }
        if let Ok(val) = std::env::var("EXCHANGE_IQ_MAX_CONCURRENT_EMBEDS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_embeds = v;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = Some(d);
            }
        }
        if let Ok(val) = std::env::var("LLM_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.request_timeout_secs = v;
            }
        }
        // LLM_API_KEY takes precedence; OPENAI_API_KEY kept for parity with
        // the usual OpenAI tooling convention.
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.llm.provider == "openai" && self.llm.api_key.is_none() {
            anyhow::bail!(
                "LLM_API_KEY (or OPENAI_API_KEY) is required for the openai provider"
            );
        }
        if self.top_k == 0 {
            anyhow::bail!("EXCHANGE_IQ_TOP_K must be at least 1");
        }
        Ok(())
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
