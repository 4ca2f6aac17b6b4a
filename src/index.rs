//! In-memory embedding index: one-time bulk embedding at startup, then
//! read-only cosine-similarity ranking for the process lifetime.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::LlmConfig;
use crate::corpus::Document;
use crate::error::Error;
use crate::llm::embeddings;

/// A document paired with its similarity to one query. Derived per
/// request, never stored.
#[derive(Debug, Clone, Copy)]
pub struct RankedDocument<'a> {
    pub document: &'a Document,
    pub score: f32,
}

/// Holds the corpus and its embeddings. Mutated only by `embed_all`
/// during startup; once the façade installs it behind an `Arc` it is
/// shared read-only and ranking needs no locking.
#[derive(Debug)]
pub struct DocumentIndex {
    documents: Vec<Document>,
    /// Model identifier locked by the first `embed_all`. Vectors from
    /// different models are not comparable, so a later call with another
    /// model is refused outright.
    embedding_model: Option<String>,
}

impl DocumentIndex {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            embedding_model: None,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vector dimension of the index: the first stored embedding decides.
    /// `None` until something has been embedded.
    pub fn dimension(&self) -> Option<usize> {
        self.documents
            .iter()
            .find_map(|d| d.embedding.as_ref().map(|e| e.len()))
    }

    /// Embed every document that does not have a vector yet, one request
    /// per document, at most `max_concurrent` in flight.
    ///
    /// All-or-nothing: vectors are assigned only after every request
    /// succeeded and every dimension checked out, so a failure never
    /// leaves a partially embedded index behind. The model identifier is
    /// checked before any request goes out; re-embedding with a different
    /// model fails fast instead of silently mixing vector spaces.
    pub async fn embed_all(
        &mut self,
        client: &reqwest::Client,
        config: &LlmConfig,
        max_concurrent: usize,
    ) -> Result<(), Error> {
        if let Some(locked) = &self.embedding_model {
            if locked != &config.embedding_model {
                return Err(Error::DimensionMismatch(format!(
                    "index was embedded with model {locked}; refusing to re-embed with {}",
                    config.embedding_model
                )));
            }
        }

        let mut expected_dim = config.embedding_dim.or_else(|| self.dimension());

        let pending: Vec<usize> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.embedding.is_none())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            self.embedding_model = Some(config.embedding_model.clone());
            return Ok(());
        }

        tracing::info!(
            "Embedding {} documents with {} (max {} in flight)",
            pending.len(),
            config.embedding_model,
            max_concurrent.max(1)
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(pending.len());

        for &idx in &pending {
            let client = client.clone();
            let config = config.clone();
            let content = self.documents[idx].content.clone();
            let sem = semaphore.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await;
                embeddings::embed_single(&client, &config, &content).await
            });
            handles.push((idx, handle));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (idx, handle) in handles {
            let vector = handle.await.map_err(|e| Error::Upstream {
                service: "embedding service",
                detail: format!("embedding task failed: {e}"),
            })??;
            check_dimension(
                &mut expected_dim,
                &self.documents[idx].source_label,
                &vector,
            )?;
            results.push((idx, vector));
        }

        for (idx, vector) in results {
            self.documents[idx].embedding = Some(vector);
        }
        self.embedding_model = Some(config.embedding_model.clone());

        tracing::info!(
            "Index ready: {} documents, dimension {}",
            self.documents.len(),
            self.dimension().unwrap_or(0)
        );
        Ok(())
    }

    /// Score every embedded document against `query` and return the top
    /// `k`, highest similarity first. Fewer than `k` documents returns
    /// them all; equal scores keep insertion order (stable sort).
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<RankedDocument<'_>>, Error> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if let Some(dim) = self.dimension() {
            if query.len() != dim {
                return Err(Error::DimensionMismatch(format!(
                    "query vector has {} dimensions, index has {dim}",
                    query.len()
                )));
            }
        }

        let mut scored: Vec<RankedDocument<'_>> = self
            .documents
            .iter()
            .filter_map(|doc| {
                doc.embedding.as_ref().map(|embedding| RankedDocument {
                    document: doc,
                    score: cosine_similarity(query, embedding),
                })
            })
            .collect();

        // Sort descending by score; Vec::sort_by is stable
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Validate one vector against the locked dimension, locking it on first
/// use. Mismatches name the offending document.
fn check_dimension(
    expected: &mut Option<usize>,
    source_label: &str,
    vector: &[f32],
) -> Result<(), Error> {
    match *expected {
        Some(dim) if vector.len() != dim => Err(Error::DimensionMismatch(format!(
            "document {source_label}: got {} dimensions, expected {dim}",
            vector.len()
        ))),
        Some(_) => Ok(()),
        None => {
            *expected = Some(vector.len());
            Ok(())
        }
    }
}

/// Cosine similarity with a sentinel for undefined cases: a zero-norm or
/// length-mismatched pair scores negative infinity, ranking last instead
/// of raising. Keeps ranking total without letting NaN near the sort.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return f32::NEG_INFINITY;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        f32::NEG_INFINITY
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(label: &str, embedding: Option<Vec<f32>>) -> Document {
        Document {
            content: format!("content of {label}"),
            source_label: label.to_string(),
            embedding,
        }
    }

    fn embedded_index() -> DocumentIndex {
        DocumentIndex::new(vec![
            doc("exact.txt", Some(vec![1.0, 0.0])),
            doc("close.txt", Some(vec![0.6, 0.8])),
            doc("orthogonal.txt", Some(vec![0.0, 1.0])),
        ])
    }

    #[test]
    fn test_index_debug_format_names_documents() {
        // Result helpers and error paths print the index, so the derive
        // has to stay in place.
        let repr = format!("{:?}", embedded_index());
        assert!(repr.contains("exact.txt"));
        assert!(repr.contains("embedding_model"));
    }

    // ─── Cosine similarity ───────────────────────────────

    #[test]
    fn test_cosine_identical_is_one() {
        let sim = cosine_similarity(&[0.6, 0.8], &[0.6, 0.8]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_sentinel() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), f32::NEG_INFINITY);
    }

    #[test]
    fn test_cosine_length_mismatch_is_sentinel() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), f32::NEG_INFINITY);
    }

    // ─── Ranking ─────────────────────────────────────────

    #[test]
    fn test_rank_returns_min_of_k_and_store_size() {
        let index = embedded_index();
        assert_eq!(index.rank(&[1.0, 0.0], 2).unwrap().len(), 2);
        // k beyond the store returns everything, not an error
        assert_eq!(index.rank(&[1.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_rank_orders_by_descending_similarity() {
        let index = embedded_index();
        let ranked = index.rank(&[1.0, 0.0], 3).unwrap();
        let labels: Vec<&str> = ranked.iter().map(|r| r.document.source_label.as_str()).collect();
        assert_eq!(labels, vec!["exact.txt", "close.txt", "orthogonal.txt"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_is_invariant_to_query_rescaling() {
        let index = embedded_index();
        let base = index.rank(&[0.3, 0.4], 3).unwrap();
        let doubled = index.rank(&[0.6, 0.8], 3).unwrap();
        let order = |r: &[RankedDocument<'_>]| {
            r.iter().map(|h| h.document.source_label.clone()).collect::<Vec<_>>()
        };
        assert_eq!(order(&base), order(&doubled));
    }

    #[test]
    fn test_rank_is_invariant_to_document_rescaling() {
        let scaled = DocumentIndex::new(vec![
            doc("exact.txt", Some(vec![7.0, 0.0])),
            doc("close.txt", Some(vec![0.3, 0.4])),
            doc("orthogonal.txt", Some(vec![0.0, 20.0])),
        ]);
        let ranked = scaled.rank(&[1.0, 0.0], 3).unwrap();
        let labels: Vec<&str> = ranked.iter().map(|r| r.document.source_label.as_str()).collect();
        // same order as the unscaled fixture in test_rank_orders_by_descending_similarity
        assert_eq!(labels, vec!["exact.txt", "close.txt", "orthogonal.txt"]);
    }

    #[test]
    fn test_zero_norm_document_ranks_last() {
        let index = DocumentIndex::new(vec![
            doc("silent.txt", Some(vec![0.0, 0.0])),
            doc("loud.txt", Some(vec![0.2, 0.1])),
        ]);
        let ranked = index.rank(&[1.0, 1.0], 2).unwrap();
        assert_eq!(ranked[0].document.source_label, "loud.txt");
        assert_eq!(ranked[1].score, f32::NEG_INFINITY);
    }

    #[test]
    fn test_rank_rejects_k_zero() {
        let index = embedded_index();
        let err = index.rank(&[1.0, 0.0], 0).unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[test]
    fn test_rank_rejects_query_dimension_mismatch() {
        let index = embedded_index();
        let err = index.rank(&[1.0, 0.0, 0.0], 3).unwrap_err();
        assert_eq!(err.code(), "dimension_mismatch");
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let index = DocumentIndex::new(vec![
            doc("first.txt", Some(vec![1.0, 0.0])),
            doc("second.txt", Some(vec![1.0, 0.0])),
        ]);
        let ranked = index.rank(&[0.0, 1.0], 2).unwrap();
        assert_eq!(ranked[0].document.source_label, "first.txt");
        assert_eq!(ranked[1].document.source_label, "second.txt");
    }

    #[test]
    fn test_rank_skips_unembedded_documents() {
        let index = DocumentIndex::new(vec![
            doc("embedded.txt", Some(vec![1.0, 0.0])),
            doc("pending.txt", None),
        ]);
        let ranked = index.rank(&[1.0, 0.0], 5).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].document.source_label, "embedded.txt");
    }

    #[test]
    fn test_rank_on_empty_index_returns_nothing() {
        let index = DocumentIndex::new(Vec::new());
        assert!(index.rank(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    // ─── Dimension guard ─────────────────────────────────

    #[test]
    fn test_check_dimension_locks_on_first_vector() {
        let mut expected = None;
        check_dimension(&mut expected, "a.txt", &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(expected, Some(3));
        check_dimension(&mut expected, "b.txt", &[4.0, 5.0, 6.0]).unwrap();
    }

    #[test]
    fn test_check_dimension_rejects_mismatch() {
        let mut expected = Some(3);
        let err = check_dimension(&mut expected, "bad.txt", &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.code(), "dimension_mismatch");
        assert!(err.to_string().contains("bad.txt"));
    }

    // ─── Model lock ──────────────────────────────────────

    #[tokio::test]
    async fn test_embed_all_rejects_model_swap() {
        // Every document already carries a vector, so neither call needs
        // the network: the first locks the model, the second must refuse.
        let mut index = DocumentIndex::new(vec![doc("a.txt", Some(vec![1.0, 0.0]))]);
        let client = reqwest::Client::new();

        let config = LlmConfig {
            embedding_model: "text-embedding-3-small".to_string(),
            ..LlmConfig::default()
        };
        index.embed_all(&client, &config, 4).await.unwrap();

        let swapped = LlmConfig {
            embedding_model: "nomic-embed-text".to_string(),
            ..LlmConfig::default()
        };
        let err = index.embed_all(&client, &swapped, 4).await.unwrap_err();
        assert_eq!(err.code(), "dimension_mismatch");
        assert!(err.to_string().contains("nomic-embed-text"));
    }

    #[tokio::test]
    async fn test_embed_all_with_nothing_pending_is_a_noop() {
        let mut index = DocumentIndex::new(vec![
            doc("a.txt", Some(vec![1.0, 0.0])),
            doc("b.txt", Some(vec![0.0, 1.0])),
        ]);
        let client = reqwest::Client::new();
        let config = LlmConfig::default();

        index.embed_all(&client, &config, 4).await.unwrap();
        assert_eq!(index.dimension(), Some(2));
        // repeat with the same model stays fine
        index.embed_all(&client, &config, 4).await.unwrap();
    }
}
