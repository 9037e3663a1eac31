//! reqwest implementation of [`DocumentApi`].

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{DocumentApi, ProgressFn};
use crate::models::{
    AnalysisResult, AskRequest, AskResponse, ChatEntry, DeleteResponse, Document, UploadReceipt,
};
use crate::upload::UploadFile;
use crate::{Error, Result};

/// Size of the body chunks handed to the HTTP stack during upload.
/// Progress is reported once per chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    /// Backend origin without trailing slash, e.g. `http://localhost:8001`
    base_url: String,
}

impl HttpApi {
    /// Create a client for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The backend origin this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

/// FastAPI error body: `{"detail": ...}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Turn a response into `T`, mapping non-2xx statuses onto [`Error`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let detail = match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(detail));
        }
        return Err(Error::Status {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| Error::UnexpectedResponse(e.to_string()))
}

impl DocumentApi for HttpApi {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        tracing::debug!("GET /documents");
        let response = self.client.get(self.url("/documents")).send().await?;
        decode(response).await
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        tracing::debug!(document_id = id, "GET /documents/{{id}}");
        let response = self
            .client
            .get(self.url(&format!("/documents/{id}")))
            .send()
            .await?;
        decode(response).await
    }

    async fn upload_document(&self, file: UploadFile, progress: ProgressFn) -> Result<UploadReceipt> {
        let total = file.len() as u64;
        tracing::debug!(filename = %file.filename, bytes = total, "POST /documents/upload");

        let chunks: Vec<Vec<u8>> = file
            .contents
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.filename.clone())
            .mime_str(file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/documents/upload"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_document(&self, id: &str) -> Result<DeleteResponse> {
        tracing::debug!(document_id = id, "DELETE /documents/{{id}}");
        let response = self
            .client
            .delete(self.url(&format!("/documents/{id}")))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        decode(response).await
    }

    async fn analyze_document(&self, id: &str) -> Result<AnalysisResult> {
        tracing::debug!(document_id = id, "POST /documents/{{id}}/analyze");
        let response = self
            .client
            .post(self.url(&format!("/documents/{id}/analyze")))
            .send()
            .await?;
        decode(response).await
    }

    async fn chat_history(&self, id: &str) -> Result<Vec<ChatEntry>> {
        tracing::debug!(document_id = id, "GET /documents/{{id}}/chat");
        let response = self
            .client
            .get(self.url(&format!("/documents/{id}/chat")))
            .send()
            .await?;
        decode(response).await
    }

    async fn ask(&self, document_id: &str, question: &str) -> Result<String> {
        tracing::debug!(document_id, "POST /documents/ask");
        let body = AskRequest {
            document_id: document_id.to_string(),
            question: question.to_string(),
        };
        let response = self
            .client
            .post(self.url("/documents/ask"))
            .json(&body)
            .send()
            .await?;
        let answer: AskResponse = decode(response).await?;
        Ok(answer.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_api_prefix() {
        let api = HttpApi::new("http://localhost:8001/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8001");
        assert_eq!(api.url("/documents"), "http://localhost:8001/api/documents");
    }
}
