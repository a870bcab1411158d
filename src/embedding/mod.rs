//! Embedding and generation client for the remote model runtime.
//!
//! Both operations speak to an Ollama-compatible HTTP endpoint. Responses are
//! resolved into typed results at this boundary: callers only ever see a vector,
//! an answer string, or a structured error, never the raw response shape.
//! Usage accounting is deliberately left to callers, who know which user to
//! attribute a call to.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while producing an embedding vector.
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    /// The embedding endpoint could not be reached or rejected the request.
    #[error("embedding request failed: {0}")]
    RequestFailed(String),
    /// The endpoint answered but the payload carried no usable vector.
    #[error("malformed embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors raised while generating an answer.
#[derive(Debug, Error)]
pub enum GenerationServiceError {
    /// The generation endpoint could not be reached or rejected the request.
    #[error("generation request failed: {0}")]
    RequestFailed(String),
    /// The model reported an explicit error instead of an answer.
    #[error("generation model reported an error: {0}")]
    ModelError(String),
    /// The endpoint answered but the payload carried neither answer nor error.
    #[error("malformed generation response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by embedding/generation backends.
///
/// `embed` turns text into a fixed-length vector; `generate` turns a grounded
/// prompt into one free-text answer with streaming disabled.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for the supplied text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError>;

    /// Produce a single free-text completion for the supplied prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationServiceError>;
}

/// HTTP client for an Ollama-compatible model runtime.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    embedding_model: String,
    generation_model: String,
    embed_timeout: Duration,
    generate_timeout: Duration,
}

impl OllamaClient {
    /// Construct a client from explicit settings.
    pub fn new(
        base_url: String,
        embedding_model: String,
        generation_model: String,
        embed_timeout: Duration,
        generate_timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .user_agent("docquery/0.2")
            .build()
            .expect("Failed to construct reqwest::Client for model runtime");
        Self {
            http,
            base_url,
            embedding_model,
            generation_model,
            embed_timeout,
            generate_timeout,
        }
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ollama_url.clone(),
            config.embedding_model.clone(),
            config.generation_model.clone(),
            Duration::from_secs(config.embed_timeout_secs),
            Duration::from_secs(config.generate_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

/// Raw generation reply, resolved exactly once into content or error.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateReply {
    Content {
        response: String,
        #[serde(default)]
        done: bool,
    },
    Error {
        error: String,
    },
}

#[async_trait]
impl EmbeddingClient for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        let payload = json!({
            "model": self.embedding_model,
            "prompt": text,
        });

        let response = self
            .http
            .post(self.endpoint("api/embeddings"))
            .timeout(self.embed_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                EmbeddingServiceError::RequestFailed(format!(
                    "failed to reach model runtime at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingServiceError::RequestFailed(format!(
                "model runtime returned {status}: {body}"
            )));
        }

        let body: EmbeddingsResponse = response.json().await.map_err(|error| {
            EmbeddingServiceError::InvalidResponse(format!(
                "failed to decode embedding response: {error}"
            ))
        })?;

        match body.embedding {
            Some(vector) if !vector.is_empty() => Ok(vector),
            Some(_) => Err(EmbeddingServiceError::InvalidResponse(
                "embedding field was empty".into(),
            )),
            None => Err(EmbeddingServiceError::InvalidResponse(
                "response carried no embedding field".into(),
            )),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationServiceError> {
        let payload = json!({
            "model": self.generation_model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .http
            .post(self.endpoint("api/generate"))
            .timeout(self.generate_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                GenerationServiceError::RequestFailed(format!(
                    "failed to reach model runtime at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationServiceError::RequestFailed(format!(
                "model runtime returned {status}: {body}"
            )));
        }

        let body: GenerateReply = response.json().await.map_err(|error| {
            GenerationServiceError::InvalidResponse(format!(
                "failed to decode generation response: {error}"
            ))
        })?;

        match body {
            GenerateReply::Content { response, done } => {
                if !done {
                    return Err(GenerationServiceError::InvalidResponse(
                        "generation response incomplete (streaming not supported)".into(),
                    ));
                }
                Ok(response.trim().to_string())
            }
            GenerateReply::Error { error } => Err(GenerationServiceError::ModelError(error)),
        }
    }
}
