//! HTTP client wrapper for the Qdrant-backed knowledge collection.

use crate::config::get_config;
use crate::store::{
    filters::build_query_filter,
    payload::build_payload,
    types::{
        CountResponse, IndexedRecord, QueryFilter, QueryResponse, QueryResponseResult,
        ScoredRecord, StoreError,
    },
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Uniform contract over the external embedding+ANN engine.
///
/// The collection is created with Euclid distance so the score reported by the
/// engine is a distance: lower is better, and similarity normalization happens
/// in the retrieval layer. Storage errors surface as a single [`StoreError`];
/// callers do not retry here.
pub struct VectorStore {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) collection: String,
    pub(crate) vector_size: u64,
    pub(crate) batch_size: usize,
}

impl VectorStore {
    /// Construct a new store handle with explicit connection parameters.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        collection: String,
        vector_size: u64,
        batch_size: usize,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("cora/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = normalize_base_url(base_url).map_err(StoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %collection,
            vector_size,
            "Initialized vector store client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
            collection,
            vector_size,
            batch_size: batch_size.max(1),
        })
    }

    /// Construct a store handle from the process configuration.
    pub fn from_config() -> Result<Self, StoreError> {
        let config = get_config();
        Self::new(
            &config.qdrant_url,
            config.qdrant_api_key.clone(),
            config.qdrant_collection_name.clone(),
            config.embedding_dimension as u64,
            config.upsert_batch_size,
        )
    }

    /// Location of the persisted collection, for operator-facing output.
    pub fn location(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// Create the collection only when it is missing.
    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        tracing::debug!(
            collection = %self.collection,
            vector_size = self.vector_size,
            "Creating collection"
        );
        self.create_collection().await
    }

    /// Idempotently upsert records, submitting batches of up to the configured size.
    ///
    /// Record identities are deterministic, so re-submitting unchanged records
    /// overwrites points in place and the collection count does not grow.
    pub async fn upsert(&self, records: &[IndexedRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut submitted = 0;
        for batch in records.chunks(self.batch_size) {
            let points: Vec<Value> = batch
                .iter()
                .map(|record| {
                    json!({
                        "id": record.record_id.to_string(),
                        "vector": record.embedding,
                        "payload": build_payload(record),
                    })
                })
                .collect();

            let response = self
                .request(
                    Method::PUT,
                    &format!("collections/{}/points", self.collection),
                )?
                .query(&[("wait", true)])
                .json(&json!({ "points": points }))
                .send()
                .await?;

            let count = batch.len();
            self.ensure_success(response, || {
                tracing::debug!(collection = %self.collection, points = count, "Batch upserted");
            })
            .await?;
            submitted += count;
        }

        Ok(submitted)
    }

    /// Similarity query returning up to `k` records ordered by ascending distance.
    pub async fn query(
        &self,
        embedding: Vec<f32>,
        k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let mut body = json!({
            "query": embedding,
            "limit": k,
            "with_payload": true,
        });
        if let Some(filter_value) = build_query_filter(filter) {
            let obj = body
                .as_object_mut()
                .expect("query body should remain an object");
            obj.insert("filter".into(), filter_value);
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/query", self.collection),
            )?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Store query failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        let results = points
            .into_iter()
            .map(|point| ScoredRecord {
                id: stringify_point_id(point.id),
                distance: point.score,
                payload: point.payload,
            })
            .collect();

        Ok(results)
    }

    /// Exact number of records currently stored in the collection.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let response = self
            .request(
                Method::POST,
                &format!("collections/{}/points/count", self.collection),
            )?
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Store count failed");
            return Err(error);
        }

        let payload: CountResponse = response.json().await?;
        Ok(payload.result.count)
    }

    /// Destroy the collection and recreate it empty.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("collections/{}", self.collection))?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Store reset failed");
                return Err(error);
            }
        }

        tracing::info!(collection = %self.collection, "Collection destroyed");
        self.create_collection().await
    }

    async fn create_collection(&self) -> Result<(), StoreError> {
        let body = json!({
            "vectors": {
                "size": self.vector_size,
                "distance": "Euclid"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{}", self.collection))?
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection ensured/created");
        })
        .await
    }

    async fn collection_exists(&self) -> Result<bool, StoreError> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))?
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Store request failed");
            Err(error)
        }
    }
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

fn stringify_point_id(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
