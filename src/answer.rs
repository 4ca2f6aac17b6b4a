//! Answer synthesis: builds a constrained prompt from ranked context and
//! asks the completion model for the answer text.

use crate::config::{AnswerStyle, LlmConfig};
use crate::error::Error;
use crate::index::RankedDocument;
use crate::llm::chat::{self, CompletionRequest};

/// Both answer paths sample at the same fixed temperature.
const TEMPERATURE: f32 = 0.7;

/// Output budget for the open path (no retrieval context).
const OPEN_MAX_TOKENS: u32 = 300;

const OPEN_PERSONA: &str =
    "You are a helpful assistant that provides clear and accurate answers to any question.";

/// Parameterizes the grounded path: persona, prompt framing, output
/// budget, and whether context chunks carry source attribution. One
/// profile per process, derived from the configured answer style.
#[derive(Debug, Clone)]
pub struct AnswerProfile {
    pub persona: String,
    task_preamble: String,
    closing_instruction: String,
    pub max_tokens: u32,
    pub cite_sources: bool,
}

impl AnswerProfile {
    pub fn for_style(style: AnswerStyle, topic: &str) -> Self {
        match style {
            AnswerStyle::Concise => Self {
                persona: format!(
                    "You are a friendly {topic} expert who explains crypto concepts in \
                     simple, easy-to-understand terms for beginners."
                ),
                task_preamble: format!(
                    "You are a {topic} expert assistant. Based on the following context \
                     about {topic}, please answer the question in exactly two simple, \
                     friendly sentences that a new user can easily understand."
                ),
                closing_instruction:
                    "Please provide a clear, concise answer in exactly two sentences."
                        .to_string(),
                max_tokens: 150,
                cite_sources: true,
            },
            AnswerStyle::Detailed => Self {
                persona: format!("You are a helpful assistant that explains {topic}."),
                task_preamble: format!(
                    "Based on the following context about {topic}, please answer the question."
                ),
                closing_instruction:
                    "Please provide a comprehensive answer based on the context above."
                        .to_string(),
                max_tokens: 500,
                cite_sources: false,
            },
        }
    }
}

/// Concatenate ranked documents into the context block, most relevant
/// first. With attribution each chunk is prefixed `From {label}:` so the
/// model can ground its answer in a named source.
fn format_context(ranked: &[RankedDocument<'_>], cite_sources: bool) -> String {
    ranked
        .iter()
        .map(|r| {
            if cite_sources {
                format!("From {}:\n{}", r.document.source_label, r.document.content)
            } else {
                r.document.content.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_user_prompt(profile: &AnswerProfile, context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{context}\n\nQuestion: {question}\n\n{}",
        profile.task_preamble, profile.closing_instruction
    )
}

/// Answer a question grounded in the ranked context.
///
/// The output-shape instruction (two sentences, comprehensive, ...) is a
/// prompt-level request to the model, not a verified invariant: the
/// returned text is whatever the model produced. An empty `ranked` slice
/// yields an empty context block, so the model answers from the framing
/// alone.
pub async fn answer_grounded(
    client: &reqwest::Client,
    config: &LlmConfig,
    profile: &AnswerProfile,
    question: &str,
    ranked: &[RankedDocument<'_>],
) -> Result<String, Error> {
    let context = format_context(ranked, profile.cite_sources);
    let user = build_user_prompt(profile, &context, question);

    chat::complete(
        client,
        config,
        &CompletionRequest {
            system: &profile.persona,
            user: &user,
            temperature: TEMPERATURE,
            max_tokens: profile.max_tokens,
        },
    )
    .await
}

/// Answer an off-domain question with the generic persona and no
/// retrieval context.
pub async fn answer_open(
    client: &reqwest::Client,
    config: &LlmConfig,
    question: &str,
) -> Result<String, Error> {
    chat::complete(
        client,
        config,
        &CompletionRequest {
            system: OPEN_PERSONA,
            user: question,
            temperature: TEMPERATURE,
            max_tokens: OPEN_MAX_TOKENS,
        },
    )
    .await
}
