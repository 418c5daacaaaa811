//! In-memory stand-ins for the vector store and the model providers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::database::{DocumentObject, SearchHit, VectorDBError, VectorStore};
use crate::llm::session::RagSession;
use crate::providers::{
    Candidate, Embedding, EmbeddingProvider, EmbeddingRequest, GenerationResponse,
    GenerativeProvider, Part, ProviderError,
};

#[derive(Default)]
pub struct StoreLog {
    pub collections: Vec<(String, u64)>,
    pub batches: Vec<Vec<DocumentObject>>,
    pub queries: Vec<(Vec<f32>, u64, Vec<String>)>,
}

#[derive(Clone, Default)]
pub struct MockStore {
    pub log: Arc<Mutex<StoreLog>>,
    pub hits: Vec<SearchHit>,
    pub fail_writes: bool,
}

impl MockStore {
    pub fn with_texts(texts: &[&str]) -> Self {
        let hits = texts
            .iter()
            .enumerate()
            .map(|(i, text)| SearchHit {
                id: format!("hit-{}", i),
                score: 0.1,
                payload: HashMap::from([(
                    "text".to_string(),
                    serde_json::Value::String(text.to_string()),
                )]),
            })
            .collect();
        Self {
            hits,
            ..Default::default()
        }
    }
}

#[async_trait]
impl VectorStore for MockStore {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDBError> {
        self.log
            .lock()
            .unwrap()
            .collections
            .push((name.to_string(), vector_size));
        Ok(())
    }

    async fn insert_documents(
        &self,
        _collection: &str,
        documents: Vec<DocumentObject>,
    ) -> Result<usize, VectorDBError> {
        if self.fail_writes {
            return Err(VectorDBError::Operation("write rejected".to_string()));
        }
        let count = documents.len();
        self.log.lock().unwrap().batches.push(documents);
        Ok(count)
    }

    async fn search_vectors(
        &self,
        _collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        fields: &[&str],
    ) -> Result<Vec<SearchHit>, VectorDBError> {
        self.log.lock().unwrap().queries.push((
            query_vector,
            limit,
            fields.iter().map(|f| f.to_string()).collect(),
        ));
        Ok(self.hits.iter().take(limit as usize).cloned().collect())
    }
}

/// Embeds text as `[len, 1.0]`. Batch answers come back reversed so callers
/// must pair by id.
#[derive(Clone, Default)]
pub struct MockEmbedder {
    pub batches: Arc<Mutex<Vec<Vec<EmbeddingRequest>>>>,
    pub fail: bool,
}

fn vector_for(text: &str) -> Vec<f32> {
    vec![text.len() as f32, 1.0]
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Api {
                status: 500,
                message: "embedding backend down".to_string(),
            });
        }
        Ok(vector_for(text))
    }

    async fn embed_batch(
        &self,
        requests: &[EmbeddingRequest],
    ) -> Result<Vec<Embedding>, ProviderError> {
        self.batches.lock().unwrap().push(requests.to_vec());
        if self.fail {
            return Err(ProviderError::Api {
                status: 500,
                message: "embedding backend down".to_string(),
            });
        }
        Ok(requests
            .iter()
            .rev()
            .map(|r| Embedding {
                id: r.id,
                values: vector_for(&r.text),
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

#[derive(Clone)]
pub struct MockGenerator {
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub response: GenerationResponse,
}

impl MockGenerator {
    pub fn answering(parts: &[&str]) -> Self {
        Self::with_response(GenerationResponse {
            candidates: vec![Candidate {
                parts: parts.iter().map(|p| Part::Text(p.to_string())).collect(),
            }],
        })
    }

    pub fn with_response(response: GenerationResponse) -> Self {
        Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            response,
        }
    }
}

#[async_trait]
impl GenerativeProvider for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

pub fn session(store: MockStore, embedder: MockEmbedder, generator: MockGenerator) -> RagSession {
    RagSession::new(
        Box::new(store),
        Box::new(embedder),
        Box::new(generator),
        "Document",
    )
}
