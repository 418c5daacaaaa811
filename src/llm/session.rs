use thiserror::Error;

use crate::config::AppConfig;
use crate::database::{VectorDB, VectorDBError, VectorStore};
use crate::providers::{EmbeddingProvider, GeminiProvider, GenerativeProvider, ProviderError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("vector database unavailable: {0}")]
    VectorDB(#[from] VectorDBError),
    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Handles shared by indexing and querying: the vector store, the embedding
/// model and the generative model, plus the target collection.
pub struct RagSession {
    pub(crate) store: Box<dyn VectorStore>,
    pub(crate) embedder: Box<dyn EmbeddingProvider>,
    pub(crate) generator: Box<dyn GenerativeProvider>,
    pub(crate) collection: String,
}

impl RagSession {
    pub fn new(
        store: Box<dyn VectorStore>,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn GenerativeProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            collection: collection.into(),
        }
    }

    /// Connects to Qdrant and builds the Gemini clients from configuration.
    pub async fn connect(config: &AppConfig) -> Result<Self, SessionError> {
        let store = VectorDB::new(&config.qdrant_url).await?;
        let gemini = GeminiProvider::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.generative_model.clone(),
            config.embedding_model.clone(),
        )?;

        let session = Self::new(
            Box::new(store),
            Box::new(gemini.clone()),
            Box::new(gemini),
            config.collection.clone(),
        );

        log::info!(
            "RAG session ready: generative model {}, embedding model {}, collection {}",
            session.generative_model(),
            session.embedding_model(),
            session.collection
        );
        Ok(session)
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn generative_model(&self) -> &str {
        self.generator.model_name()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}
