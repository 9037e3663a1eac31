//! Common test utilities for brief integration tests.
//!
//! Provides:
//! - `FakeBackend`: an in-process HTTP server speaking the backend's
//!   `/api/documents` protocol, backed by in-memory state
//! - `TestEnv`: isolated config/data directories for running the binary

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
pub use tempfile::TempDir;

/// Confirmation text the backend sends for a successful delete.
pub const DELETED: &str = "Document deleted successfully";

const ACCEPTED: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// A stored document, as the backend keeps it.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub size: usize,
    pub status: String,
    pub summary: Option<String>,
    pub risk_assessment: Option<String>,
}

impl StoredDocument {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "filename": self.filename,
            "file_path": format!("uploads/{}", self.id),
            "file_type": self.file_type,
            // Naive timestamp, the way the backend serializes datetimes
            "upload_date": "2025-03-01T10:15:00.123456",
            "analysis_status": self.status,
            "summary": self.summary,
            "key_clauses": null,
            "risk_assessment": self.risk_assessment,
        })
    }
}

/// Mutable backend state, shared with the test.
#[derive(Debug, Default)]
pub struct BackendState {
    pub documents: Vec<StoredDocument>,
    pub chats: HashMap<String, Vec<Value>>,
    pub analyze_calls: u32,
    pub delete_calls: u32,
    /// Analysis requests answer 500 with a detail body
    pub fail_analyze: bool,
    /// Ids whose delete answers 500
    pub fail_delete: Vec<String>,
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process backend bound to an ephemeral localhost port.
pub struct FakeBackend {
    pub url: String,
    pub state: Shared,
}

impl FakeBackend {
    /// Start serving on a background thread with its own runtime.
    pub fn start() -> Self {
        let state: Shared = Arc::default();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let app = router(state.clone());
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self { url, state }
    }

    /// Add a document directly and return its id.
    pub fn insert(&self, filename: &str, status: &str, summary: Option<&str>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.state.lock().unwrap().documents.push(StoredDocument {
            id: id.clone(),
            filename: filename.to_string(),
            file_type: "application/pdf".to_string(),
            size: 0,
            status: status.to_string(),
            summary: summary.map(str::to_string),
            risk_assessment: None,
        });
        id
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn document_count(&self) -> usize {
        self.with(|s| s.documents.len())
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/documents", get(list_documents))
        .route("/api/documents/upload", post(upload_document))
        .route("/api/documents/ask", post(ask))
        .route(
            "/api/documents/:id",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/:id/analyze", post(analyze_document))
        .route("/api/documents/:id/chat", get(chat_history))
        .with_state(state)
}

async fn list_documents(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(Value::Array(
        state.documents.iter().map(StoredDocument::to_json).collect(),
    ))
}

async fn get_document(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.documents.iter().find(|d| d.id == id) {
        Some(doc) => Json(doc.to_json()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn upload_document(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let file_type = field.content_type().unwrap_or_default().to_string();
        let ext = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
        if !filename.contains('.') || !ACCEPTED.contains(&ext.as_str()) {
            return detail(StatusCode::BAD_REQUEST, "Unsupported file type");
        }
        let Ok(bytes) = field.bytes().await else {
            return detail(StatusCode::BAD_REQUEST, "Could not read upload");
        };

        let id = uuid::Uuid::new_v4().to_string();
        state.lock().unwrap().documents.push(StoredDocument {
            id: id.clone(),
            filename: filename.clone(),
            file_type,
            size: bytes.len(),
            status: "pending".to_string(),
            summary: None,
            risk_assessment: None,
        });
        return Json(json!({
            "document_id": id,
            "filename": filename,
            "status": "uploaded",
        }))
        .into_response();
    }
    detail(StatusCode::UNPROCESSABLE_ENTITY, "Missing file field")
}

async fn delete_document(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    state.delete_calls += 1;
    if state.fail_delete.contains(&id) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable");
    }
    let before = state.documents.len();
    state.documents.retain(|d| d.id != id);
    if state.documents.len() == before {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    state.chats.remove(&id);
    Json(json!({ "message": DELETED })).into_response()
}

async fn analyze_document(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    state.analyze_calls += 1;
    if state.fail_analyze {
        return detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error analyzing document: model unavailable",
        );
    }
    let Some(doc) = state.documents.iter_mut().find(|d| d.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    };

    let summary = format!(
        "## DOCUMENT SUMMARY\n{} is a residential lease.\n\n\
         ## KEY CLAUSES\n1. Termination: 30 days notice.\n\n\
         ## RISK ASSESSMENT\nAutomatic renewal.",
        doc.filename
    );
    doc.status = "completed".to_string();
    doc.summary = Some(summary.clone());
    doc.risk_assessment = Some("Automatic renewal.".to_string());

    Json(json!({
        "summary": summary,
        "key_clauses": [],
        "risk_assessment": "Automatic renewal.",
    }))
    .into_response()
}

async fn chat_history(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    if !state.documents.iter().any(|d| d.id == id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    let entries = state.chats.get(&id).cloned().unwrap_or_default();
    Json(Value::Array(entries)).into_response()
}

async fn ask(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let document_id = body["document_id"].as_str().unwrap_or_default().to_string();
    let question = body["question"].as_str().unwrap_or_default().to_string();

    let mut state = state.lock().unwrap();
    if !state.documents.iter().any(|d| d.id == document_id) {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    let answer = format!("The answer to \"{question}\" is in section 4.");
    state.chats.entry(document_id).or_default().push(json!({
        "question": question,
        "answer": answer,
        "timestamp": "2025-03-01T11:00:00",
    }));
    Json(json!({ "answer": answer })).into_response()
}

/// A test environment with isolated config and data directories.
///
/// The `brief()` method returns a `Command` with `BRIEF_CONFIG_DIR` and
/// `BRIEF_DATA_DIR` set per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the brief binary with isolated directories.
    pub fn brief(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_brief"));
        cmd.env("BRIEF_CONFIG_DIR", self.config_dir.path());
        cmd.env("BRIEF_DATA_DIR", self.data_dir.path());
        cmd.env_remove("BRIEF_BACKEND_URL");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// A brief command pointed at `backend`.
    pub fn brief_at(&self, backend: &FakeBackend) -> Command {
        let mut cmd = self.brief();
        cmd.env("BRIEF_BACKEND_URL", &backend.url);
        cmd
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.config_dir.path().join("config.kdl")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}
