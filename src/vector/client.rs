//! HTTP adapter for a Qdrant-backed vector index.

use crate::config::Config;
use crate::vector::{
    filters::build_scope_filter,
    payload::{build_payload, point_id_for},
    types::{
        CollectionInfoResponse, QueryResponse, QueryResponseResult, SearchScope, VectorIndex,
        VectorIndexError, VectorMatch, VectorMetadata, VectorRecord,
    },
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Lightweight HTTP client for Qdrant operations.
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Construct a new adapter from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, VectorIndexError> {
        Self::new(
            &config.qdrant_url,
            config.qdrant_api_key.clone(),
            config.qdrant_collection_name.clone(),
            config.embedding_dimension,
        )
    }

    /// Construct a new adapter from explicit settings.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection: String,
        dimension: usize,
    ) -> Result<Self, VectorIndexError> {
        let client = Client::builder()
            .user_agent("docquery/0.2")
            .build()
            .map_err(VectorIndexError::Http)?;
        let base_url = normalize_base_url(url).map_err(VectorIndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %collection,
            dimension,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
            collection,
            dimension,
        })
    }

    async fn collection_dimension(&self) -> Result<Option<u64>, VectorIndexError> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let info: CollectionInfoResponse = response.json().await?;
                Ok(Some(info.result.config.params.vectors.size))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = VectorIndexError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Collection lookup failed");
                Err(error)
            }
        }
    }

    async fn create_collection(&self) -> Result<(), VectorIndexError> {
        let body = json!({
            "vectors": {
                "size": self.dimension as u64,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{}", self.collection))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection created");
        })
        .await
    }

    /// Ensure payload indexes exist for the scope filter fields.
    async fn ensure_payload_indexes(&self) -> Result<(), VectorIndexError> {
        let fields: [(&str, &str); 3] = [
            ("user_id", "keyword"),
            ("document_id", "keyword"),
            ("chunk_index", "integer"),
        ];

        for (field, schema) in fields {
            let body = json!({
                "field_name": field,
                "field_schema": schema,
            });

            let response = self
                .request(Method::PUT, &format!("collections/{}/index", self.collection))
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() || response.status() == StatusCode::CONFLICT {
                tracing::debug!(collection = %self.collection, field, schema, "Payload index ensured");
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = VectorIndexError::UnexpectedStatus { status, body };
                tracing::warn!(collection = %self.collection, field, schema, error = %error, "Failed to ensure payload index");
            }
        }

        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), VectorIndexError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorIndexError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
        match self.collection_dimension().await? {
            Some(size) if size == self.dimension as u64 => Ok(()),
            Some(size) => {
                let error = VectorIndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: size as usize,
                };
                tracing::error!(collection = %self.collection, error = %error, "Collection provisioned with a different dimension");
                Err(error)
            }
            None => {
                self.create_collection().await?;
                self.ensure_payload_indexes().await
            }
        }
    }

    async fn upsert(&self, record: VectorRecord) -> Result<(), VectorIndexError> {
        if record.embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: record.embedding.len(),
            });
        }

        let point = json!({
            "id": point_id_for(&record.vector_id),
            "vector": record.embedding,
            "payload": build_payload(&record),
        });

        let vector_id = record.vector_id.clone();
        let response = self
            .request(Method::PUT, &format!("collections/{}/points", self.collection))
            .query(&[("wait", true)])
            .json(&json!({ "points": [point] }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, vector_id = %vector_id, "Vector upserted");
        })
        .await
    }

    async fn query(
        &self,
        embedding: &[f32],
        scope: &SearchScope,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let body = json!({
            "query": embedding,
            "limit": top_k,
            "with_payload": true,
            "filter": build_scope_filter(scope),
        });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/query", self.collection),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorIndexError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };

        let matches = points
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload?;
                match (
                    payload.get("vector_id").and_then(Value::as_str),
                    metadata_from_payload(&payload),
                ) {
                    (Some(vector_id), Some(metadata)) => Some(VectorMatch {
                        vector_id: vector_id.to_string(),
                        score: point.score,
                        metadata,
                    }),
                    _ => {
                        tracing::warn!(
                            collection = %self.collection,
                            "Dropping search hit with an incomplete payload"
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(matches)
    }
}

fn metadata_from_payload(payload: &serde_json::Map<String, Value>) -> Option<VectorMetadata> {
    Some(VectorMetadata {
        user_id: payload.get("user_id")?.as_str()?.to_string(),
        document_id: payload.get("document_id")?.as_str()?.to_string(),
        chunk_index: payload
            .get("chunk_index")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize,
        filename: payload
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
