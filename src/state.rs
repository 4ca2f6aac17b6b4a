use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::answer::AnswerProfile;
use crate::config::Config;
use crate::corpus;
use crate::error::Error;
use crate::index::DocumentIndex;

/// Where the service is in its one-way lifecycle. There is no way back
/// to `Indexing`: the index is built once and never replaced.
pub enum IndexPhase {
    /// Documents are still being loaded and embedded; queries are refused.
    Indexing,
    /// The immutable index is installed and queries are served from it.
    Ready {
        index: Arc<DocumentIndex>,
        indexed_at: DateTime<Utc>,
    },
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub answer_profile: AnswerProfile,
    pub phase: Arc<RwLock<IndexPhase>>,
    pub http_client: reqwest::Client,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let answer_profile = AnswerProfile::for_style(config.answer_style, &config.topic);

        Ok(Self {
            answer_profile,
            phase: Arc::new(RwLock::new(IndexPhase::Indexing)),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(config.llm.request_timeout())
                .build()?,
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(3)),
            config,
        })
    }

    /// Snapshot of the ready index, or `NotReady` while embedding is
    /// still in flight. Never answers from a partial index.
    pub fn ready_index(&self) -> Result<Arc<DocumentIndex>, Error> {
        match &*self.phase.read() {
            IndexPhase::Ready { index, .. } => Ok(index.clone()),
            IndexPhase::Indexing => Err(Error::NotReady),
        }
    }

    fn mark_ready(&self, index: DocumentIndex) {
        let documents = index.len();
        *self.phase.write() = IndexPhase::Ready {
            index: Arc::new(index),
            indexed_at: Utc::now(),
        };
        tracing::info!("Serving queries over {documents} documents");
    }
}

/// Load the corpus, embed it, and install the finished index. Runs once
/// at startup; any failure must abort the process so the service never
/// reports ready over a partial index.
pub async fn build_index(state: &AppState) -> Result<(), Error> {
    let documents = corpus::load_documents(
        &state.config.data_dir,
        state.config.doc_filter.as_deref(),
    )?;
    if documents.is_empty() {
        tracing::warn!(
            "No documents matched in {}; answers will have empty context",
            state.config.data_dir.display()
        );
    }

    let mut index = DocumentIndex::new(documents);
    index
        .embed_all(
            &state.http_client,
            &state.config.llm,
            state.config.max_concurrent_embeds,
        )
        .await?;

    state.mark_ready(index);
    Ok(())
}
