//! HTTP surface for Docquery.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /ingest` – Accept a stored document file for ingestion. With
//!   `"background": true` the receipt comes back immediately in `processing`
//!   state; otherwise the call returns once ingestion reached a terminal state.
//! - `POST /ask` – Answer a question from one document's content.
//! - `GET /documents` – List a user's documents with status and enabled flag.
//! - `GET /chat/history` – List a user's past exchanges for one document.
//! - `GET /metrics` – Observe ingestion and answering counters.
//!
//! Authentication, session issuance, rate limiting, and CORS belong to the
//! deployment layer in front of this router; handlers trust the `user_id`
//! they are given and the core re-applies per-user scoping underneath.

use crate::answer::{AnswerApi, AnswerError};
use crate::ingest::{IngestApi, IngestError};
use crate::store::{ChatMessage, Document};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Shared handler state carrying the two core services.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline surface.
    pub ingest: Arc<dyn IngestApi>,
    /// Answer synthesizer surface.
    pub answer: Arc<dyn AnswerApi>,
}

/// Build the HTTP router exposing the core API surface.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(ingest_document))
        .route("/ask", post(ask_question))
        .route("/documents", get(list_documents))
        .route("/chat/history", get(chat_history))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

/// Request body for the `POST /ingest` endpoint.
#[derive(Deserialize)]
struct IngestRequest {
    /// Path of the stored file to ingest.
    file_path: String,
    /// Identifier of the uploading user.
    user_id: String,
    /// Hand the pipeline to a background task instead of waiting.
    #[serde(default)]
    background: bool,
}

/// Success response for the `POST /ingest` endpoint.
#[derive(Serialize)]
struct IngestResponse {
    document_id: String,
    filename: String,
    total_chunks: usize,
    status: String,
}

/// Accept a stored document file for ingestion.
async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Response, AppError> {
    let IngestRequest {
        file_path,
        user_id,
        background,
    } = request;

    let (receipt, code) = if background {
        (
            state.ingest.ingest_background(&file_path, &user_id).await?,
            StatusCode::ACCEPTED,
        )
    } else {
        (
            state.ingest.ingest(&file_path, &user_id).await?,
            StatusCode::CREATED,
        )
    };

    tracing::info!(
        document_id = %receipt.document_id,
        user_id,
        background,
        status = %receipt.status,
        "Ingest request accepted"
    );
    let body = Json(IngestResponse {
        document_id: receipt.document_id,
        filename: receipt.filename,
        total_chunks: receipt.total_chunks,
        status: receipt.status.to_string(),
    });
    Ok((code, body).into_response())
}

/// Request body for the `POST /ask` endpoint.
#[derive(Deserialize)]
struct AskRequest {
    /// Natural-language question.
    question: String,
    /// Identifier of the asking user.
    user_id: String,
    /// Document the question is scoped to.
    document_id: String,
}

/// Success response for the `POST /ask` endpoint.
#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Answer a question from one document's content.
async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let answer = state
        .answer
        .answer(&request.question, &request.user_id, &request.document_id)
        .await?;
    Ok(Json(AskResponse { answer }))
}

/// Query parameters for the `GET /documents` endpoint.
#[derive(Deserialize)]
struct DocumentsQuery {
    user_id: String,
}

/// One document row in the `GET /documents` response.
#[derive(Serialize)]
struct DocumentSummary {
    document_id: String,
    filename: String,
    total_chunks: usize,
    status: String,
    enabled: bool,
    created_at: String,
}

impl From<Document> for DocumentSummary {
    fn from(document: Document) -> Self {
        Self {
            document_id: document.id,
            filename: document.filename,
            total_chunks: document.total_chunks,
            status: document.status.to_string(),
            enabled: document.enabled,
            created_at: document.created_at,
        }
    }
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    count: usize,
    documents: Vec<DocumentSummary>,
}

/// List a user's documents.
async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentsQuery>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let documents = state.ingest.list_documents(&query.user_id).await?;
    let documents: Vec<DocumentSummary> = documents.into_iter().map(Into::into).collect();
    Ok(Json(DocumentsResponse {
        count: documents.len(),
        documents,
    }))
}

/// Query parameters for the `GET /chat/history` endpoint.
#[derive(Deserialize)]
struct HistoryQuery {
    user_id: String,
    document_id: String,
}

/// One exchange row in the `GET /chat/history` response.
#[derive(Serialize)]
struct HistoryEntry {
    question: String,
    answer: String,
    created_at: String,
}

impl From<ChatMessage> for HistoryEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            question: message.question,
            answer: message.answer,
            created_at: message.created_at,
        }
    }
}

/// Response body for `GET /chat/history`.
#[derive(Serialize)]
struct HistoryResponse {
    count: usize,
    messages: Vec<HistoryEntry>,
}

/// List a user's past exchanges for one document, newest first.
async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let messages = state
        .answer
        .chat_history(&query.user_id, &query.document_id)
        .await?;
    let messages: Vec<HistoryEntry> = messages.into_iter().map(Into::into).collect();
    Ok(Json(HistoryResponse {
        count: messages.len(),
        messages,
    }))
}

/// Return a concise metrics snapshot.
async fn get_metrics(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.ingest.metrics_snapshot())
}

enum AppError {
    Ingest(IngestError),
    Answer(AnswerError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Ingest(error) if error.is_input_error() => StatusCode::BAD_REQUEST,
            Self::Ingest(IngestError::Embedding(_)) => StatusCode::BAD_GATEWAY,
            Self::Ingest(IngestError::VectorIndex(error)) => vector_status(error),
            Self::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Answer(AnswerError::BlankQuestion) => StatusCode::BAD_REQUEST,
            Self::Answer(AnswerError::UnknownDocument(_)) => StatusCode::NOT_FOUND,
            Self::Answer(AnswerError::DocumentDisabled(_)) => StatusCode::FORBIDDEN,
            Self::Answer(AnswerError::Embedding(_) | AnswerError::Generation(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Answer(AnswerError::VectorIndex(error)) => vector_status(error),
            Self::Answer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn vector_status(error: &crate::vector::VectorIndexError) -> StatusCode {
    match error {
        crate::vector::VectorIndexError::DimensionMismatch { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Ingest(error) => error.to_string(),
            Self::Answer(error) => error.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self::Ingest(inner)
    }
}

impl From<AnswerError> for AppError {
    fn from(inner: AnswerError) -> Self {
        Self::Answer(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestReceipt;
    use crate::metrics::MetricsSnapshot;
    use crate::store::DocumentStatus;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Debug)]
    struct IngestCall {
        file_path: String,
        user_id: String,
        background: bool,
    }

    struct StubIngest {
        calls: Arc<Mutex<Vec<IngestCall>>>,
    }

    impl StubIngest {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn receipt(status: DocumentStatus) -> IngestReceipt {
            IngestReceipt {
                document_id: "doc-1".into(),
                filename: "notes.txt".into(),
                total_chunks: if status == DocumentStatus::Processed {
                    3
                } else {
                    0
                },
                status,
            }
        }
    }

    #[async_trait]
    impl IngestApi for StubIngest {
        async fn ingest(
            &self,
            file_path: &str,
            user_id: &str,
        ) -> Result<IngestReceipt, IngestError> {
            self.calls.lock().await.push(IngestCall {
                file_path: file_path.into(),
                user_id: user_id.into(),
                background: false,
            });
            Ok(Self::receipt(DocumentStatus::Processed))
        }

        async fn ingest_background(
            &self,
            file_path: &str,
            user_id: &str,
        ) -> Result<IngestReceipt, IngestError> {
            self.calls.lock().await.push(IngestCall {
                file_path: file_path.into(),
                user_id: user_id.into(),
                background: true,
            });
            Ok(Self::receipt(DocumentStatus::Processing))
        }

        async fn list_documents(&self, _user_id: &str) -> Result<Vec<Document>, IngestError> {
            Ok(vec![Document {
                id: "doc-1".into(),
                user_id: "user-a".into(),
                filename: "notes.txt".into(),
                file_path: "/uploads/notes.txt".into(),
                total_chunks: 3,
                status: DocumentStatus::Processed,
                enabled: true,
                created_at: "2025-01-01T00:00:00Z".into(),
            }])
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 1,
                documents_failed: 0,
                chunks_indexed: 3,
                questions_answered: 0,
            }
        }
    }

    struct StubAnswer;

    #[async_trait]
    impl AnswerApi for StubAnswer {
        async fn answer(
            &self,
            question: &str,
            _user_id: &str,
            _document_id: &str,
        ) -> Result<String, AnswerError> {
            if question.trim().is_empty() {
                return Err(AnswerError::BlankQuestion);
            }
            Ok("A grounded answer.".into())
        }

        async fn chat_history(
            &self,
            _user_id: &str,
            _document_id: &str,
        ) -> Result<Vec<ChatMessage>, AnswerError> {
            Ok(vec![ChatMessage {
                user_id: "user-a".into(),
                document_id: "doc-1".into(),
                question: "What is this?".into(),
                answer: "A document.".into(),
                created_at: "2025-01-01T00:00:00Z".into(),
            }])
        }
    }

    fn test_state() -> (AppState, Arc<StubIngest>) {
        let ingest = Arc::new(StubIngest::new());
        let state = AppState {
            ingest: ingest.clone(),
            answer: Arc::new(StubAnswer),
        };
        (state, ingest)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn ingest_route_returns_created_receipt() {
        let (state, ingest) = test_state();
        let app = create_router(state);

        let payload = json!({
            "file_path": "/uploads/notes.txt",
            "user_id": "user-a"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["document_id"], "doc-1");
        assert_eq!(json["total_chunks"], 3);
        assert_eq!(json["status"], "processed");

        let calls = ingest.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_path, "/uploads/notes.txt");
        assert_eq!(calls[0].user_id, "user-a");
        assert!(!calls[0].background);
    }

    #[tokio::test]
    async fn background_ingest_returns_accepted_processing_receipt() {
        let (state, ingest) = test_state();
        let app = create_router(state);

        let payload = json!({
            "file_path": "/uploads/notes.txt",
            "user_id": "user-a",
            "background": true
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/ingest")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "processing");
        assert!(ingest.calls.lock().await[0].background);
    }

    #[tokio::test]
    async fn ask_route_returns_answer() {
        let (state, _) = test_state();
        let app = create_router(state);

        let payload = json!({
            "question": "What is this about?",
            "user_id": "user-a",
            "document_id": "doc-1"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], "A grounded answer.");
    }

    #[tokio::test]
    async fn blank_question_maps_to_bad_request() {
        let (state, _) = test_state();
        let app = create_router(state);

        let payload = json!({
            "question": "   ",
            "user_id": "user-a",
            "document_id": "doc-1"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn documents_route_lists_summaries() {
        let (state, _) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/documents?user_id=user-a")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["documents"][0]["document_id"], "doc-1");
        assert_eq!(json["documents"][0]["status"], "processed");
        assert_eq!(json["documents"][0]["enabled"], true);
    }

    #[tokio::test]
    async fn history_route_lists_exchanges() {
        let (state, _) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/chat/history?user_id=user-a&document_id=doc-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["messages"][0]["question"], "What is this?");
    }
}
