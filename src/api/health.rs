use axum::extract::State;
use axum::Json;

use crate::models::{HealthResponse, ServiceStatus};
use crate::state::{AppState, IndexPhase};

/// GET /health: readiness probe plus index stats.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let response = match &*state.phase.read() {
        IndexPhase::Indexing => HealthResponse {
            status: ServiceStatus::Indexing,
            documents: 0,
            indexed_at: None,
        },
        IndexPhase::Ready { index, indexed_at } => HealthResponse {
            status: ServiceStatus::Ready,
            documents: index.len(),
            indexed_at: Some(*indexed_at),
        },
    };
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::build_index;

    #[tokio::test]
    async fn test_health_reports_indexing_before_the_index_exists() {
        let state = AppState::new(Config::default()).unwrap();
        let response = health(State(state)).await;
        assert_eq!(response.status, ServiceStatus::Indexing);
        assert_eq!(response.documents, 0);
        assert!(response.indexed_at.is_none());
    }

    #[tokio::test]
    async fn test_health_reports_ready_after_indexing() {
        // An empty corpus builds without any provider traffic
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let state = AppState::new(config).unwrap();
        build_index(&state).await.unwrap();

        let response = health(State(state)).await;
        assert_eq!(response.status, ServiceStatus::Ready);
        assert_eq!(response.documents, 0);
        assert!(response.indexed_at.is_some());
    }
}
