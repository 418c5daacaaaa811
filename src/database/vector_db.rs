use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, vectors_config::Config,
        with_payload_selector::SelectorOptions, CreateCollection, Distance,
        PayloadIncludeSelector, PointId, PointStruct, SearchPoints, UpsertPoints, Value,
        VectorParams, VectorsConfig, WithPayloadSelector,
    },
    Qdrant,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::qdrant_config::create_qdrant_client;

#[derive(Error, Debug)]
pub enum VectorDBError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// One stored page: its text, where it came from, and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    pub page: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection unless it already exists.
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDBError>;

    /// Writes all documents in one batch and returns how many were stored.
    async fn insert_documents(
        &self,
        collection: &str,
        documents: Vec<DocumentObject>,
    ) -> Result<usize, VectorDBError>;

    /// Nearest-vector search returning only the requested payload fields.
    async fn search_vectors(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        fields: &[&str],
    ) -> Result<Vec<SearchHit>, VectorDBError>;
}

#[derive(Clone)]
pub struct VectorDB {
    client: Arc<Qdrant>,
}

impl VectorDB {
    pub async fn new(url: &str) -> Result<Self, VectorDBError> {
        let client = create_qdrant_client(url).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl VectorStore for VectorDB {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDBError> {
        let vectors_config = VectorParams {
            size: vector_size,
            distance: Distance::Cosine.into(),
            ..Default::default()
        };

        let create_collection = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(VectorsConfig {
                config: Some(Config::Params(vectors_config)),
            }),
            ..Default::default()
        };

        match self.client.create_collection(create_collection).await {
            Ok(_) => {
                log::info!("Created collection {} ({} dimensions)", name, vector_size);
                Ok(())
            }
            Err(e) if is_already_exists(&e.to_string()) => {
                log::info!("Collection {} already exists, skipping creation", name);
                Ok(())
            }
            Err(e) => Err(VectorDBError::Operation(e.to_string())),
        }
    }

    async fn insert_documents(
        &self,
        collection: &str,
        documents: Vec<DocumentObject>,
    ) -> Result<usize, VectorDBError> {
        let points: Vec<PointStruct> = documents
            .into_iter()
            .map(|doc| {
                let mut payload = HashMap::new();
                payload.insert("text".to_string(), Value::from(doc.text));
                payload.insert("page".to_string(), Value::from(doc.page as i64));

                PointStruct {
                    id: Some(PointId {
                        point_id_options: Some(PointIdOptions::Uuid(Uuid::new_v4().to_string())),
                    }),
                    vectors: Some(doc.vector.into()),
                    payload,
                }
            })
            .collect();

        let count = points.len();
        let upsert_points = UpsertPoints {
            collection_name: collection.to_string(),
            wait: Some(true),
            points,
            ..Default::default()
        };

        self.client
            .upsert_points(upsert_points)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(count)
    }

    async fn search_vectors(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        fields: &[&str],
    ) -> Result<Vec<SearchHit>, VectorDBError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: query_vector,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Include(PayloadIncludeSelector {
                    fields: fields.iter().map(|f| f.to_string()).collect(),
                })),
            }),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    Some(PointIdOptions::Num(num)) => num.to_string(),
                    None => String::new(),
                };
                SearchHit {
                    id,
                    score: point.score,
                    payload: payload_to_json(point.payload),
                }
            })
            .collect();

        Ok(hits)
    }
}

fn is_already_exists(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already exists") || message.contains("alreadyexists")
}

fn payload_to_json(payload: HashMap<String, Value>) -> HashMap<String, serde_json::Value> {
    payload
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::try_from(v).unwrap_or(serde_json::Value::Null)))
        .collect()
}
