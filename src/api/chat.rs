use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error_response;
use crate::error::Error;
use crate::models::{ChatRequest, ChatResponse, ErrorBody};
use crate::state::AppState;
use crate::{answer, gate, llm};

const MAX_CHAT_MESSAGE_LEN: usize = 2000;

/// POST /chat: answer one question.
///
/// Off-domain questions skip retrieval and go straight to the open
/// completion path; everything else is answered from the top-k ranked
/// context.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    // ── Step 1: Validate input ────────────────────────────
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(error_response(&Error::InvalidArgument(
            "message is required".to_string(),
        )));
    }
    let message = truncate_to_char_boundary(&message, MAX_CHAT_MESSAGE_LEN);

    // ── Step 2: Require a ready index ─────────────────────
    let index = state.ready_index().map_err(|e| error_response(&e))?;

    // ── Step 3: Acquire an LLM slot ───────────────────────
    // The semaphore only closes on shutdown; report that like any other
    // not-ready state.
    let _permit = state
        .chat_semaphore
        .acquire()
        .await
        .map_err(|_| error_response(&Error::NotReady))?;

    // ── Step 4: Route off-domain questions ────────────────
    if !gate::in_domain(&message) {
        tracing::debug!("Question judged off-domain; answering without context");
        let response = answer::answer_open(&state.http_client, &state.config.llm, &message)
            .await
            .map_err(|e| error_response(&e))?;
        return Ok(Json(ChatResponse { response }));
    }

    // ── Step 5: Embed the question ────────────────────────
    let query = llm::embeddings::embed_single(&state.http_client, &state.config.llm, &message)
        .await
        .map_err(|e| error_response(&e))?;

    // ── Step 6: Rank context and synthesize ───────────────
    let ranked = index
        .rank(&query, state.config.top_k)
        .map_err(|e| error_response(&e))?;
    tracing::debug!(
        "Ranked {} context documents: {:?}",
        ranked.len(),
        ranked
            .iter()
            .map(|r| (r.document.source_label.as_str(), r.score))
            .collect::<Vec<_>>()
    );

    let response = answer::answer_grounded(
        &state.http_client,
        &state.config.llm,
        &state.answer_profile,
        &message,
        &ranked,
    )
    .await
    .map_err(|e| error_response(&e))?;

    Ok(Json(ChatResponse { response }))
}

fn truncate_to_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    s.char_indices()
        .take_while(|(i, _)| *i < max_len)
        .map(|(_, c)| c)
        .collect()
}
