//! # exchange-iq
//!
//! A retrieval-augmented Q&A service for a crypto exchange's product
//! documentation. Plain-text documents are embedded once at startup; each
//! question is answered by ranking the corpus with cosine similarity and
//! asking a completion model to synthesize an answer grounded in the
//! top-k context.
//!
//! ## Pipeline
//!
//! ```text
//!  startup:   data/*.txt ──▶ load ──▶ embed (bounded fan-out) ──▶ DocumentIndex
//!                                                                      │
//!  per query:                                                          ▼
//!  question ──▶ topic gate ──▶ embed query ──▶ cosine top-k ──▶ grounded prompt ──▶ completion
//!                  │                                                                    ▲
//!                  └── off-domain ──────────────── open prompt ────────────────────────┘
//! ```
//!
//! Until the index is installed, queries get a structured `not_ready`
//! error; the service never answers from a partially embedded corpus.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, corpus, and LLM settings
//! - [`corpus`] - Document ingestion: whole `.txt` files with provenance labels
//! - [`index`] - Embedding index with dimension guarding and cosine top-k ranking
//! - [`gate`] - Keyword heuristic deciding whether a question is on-domain
//! - [`answer`] - Prompt construction and answer synthesis (grounded and open paths)
//! - [`llm`] - Provider calls for embeddings and completions (Ollama or OpenAI-compatible)
//! - [`api`] - Axum HTTP handlers and the error-to-status mapping
//! - [`state`] - Shared application state and the one-time startup indexing
//! - [`error`] - Failure taxonomy shared across the pipeline
//! - [`models`] - Wire types for requests and responses

pub mod answer;
pub mod api;
pub mod config;
pub mod corpus;
pub mod error;
pub mod gate;
pub mod index;
pub mod llm;
pub mod models;
pub mod state;
