use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Error payload returned for any failed request: a stable machine
/// code plus a human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Lifecycle of the answering service as seen from outside.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Indexing,
    Ready,
}

/// Health response: readiness plus index stats.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub documents: usize,
    pub indexed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_serializes_to_snake_case() {
        let json = serde_json::to_value(ServiceStatus::Indexing).unwrap();
        assert_eq!(json, "indexing");
        let json = serde_json::to_value(ServiceStatus::Ready).unwrap();
        assert_eq!(json, "ready");
    }

    #[test]
    fn test_chat_request_parses_message_only_body() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"What is BNB?"}"#).unwrap();
        assert_eq!(req.message, "What is BNB?");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            code: "not_ready".to_string(),
            message: "index is still being built; try again shortly".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "not_ready");
        assert!(json["message"].as_str().unwrap().contains("index"));
    }
}
