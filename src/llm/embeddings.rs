use std::collections::HashMap;
use thiserror::Error;

use crate::database::{DocumentObject, VectorDBError};
use crate::document::Page;
use crate::llm::session::RagSession;
use crate::providers::{EmbeddingRequest, ProviderError};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("embedding batch failed: {0}")]
    Embedding(#[source] ProviderError),
    #[error("no embedding returned for page {0}")]
    MissingEmbedding(usize),
    #[error("failed to prepare collection {collection}: {source}")]
    Collection {
        collection: String,
        #[source]
        source: VectorDBError,
    },
    #[error("failed to store documents: {0}")]
    Store(#[source] VectorDBError),
}

impl RagSession {
    /// Embeds every page with text in one batch and stores one object per
    /// page in one write. Returns the number of stored objects.
    ///
    /// Pages without text (failed OCR, blank scans) are skipped. Nothing is
    /// deduplicated: indexing the same pages twice stores them twice.
    pub async fn embed_documents(&self, pages: &[Page]) -> Result<usize, IndexError> {
        let requests: Vec<EmbeddingRequest> = pages
            .iter()
            .filter_map(|page| {
                let text = page.text();
                if text.is_empty() {
                    log::warn!("page {} has no text, not indexing it", page.index());
                    return None;
                }
                Some(EmbeddingRequest {
                    id: page.index(),
                    text,
                })
            })
            .collect();

        if requests.is_empty() {
            log::warn!("no page text to index");
            return Ok(0);
        }

        let mut vectors: HashMap<usize, Vec<f32>> = self
            .embedder
            .embed_batch(&requests)
            .await
            .map_err(IndexError::Embedding)?
            .into_iter()
            .map(|embedding| (embedding.id, embedding.values))
            .collect();

        let documents = requests
            .into_iter()
            .map(|request| -> Result<DocumentObject, IndexError> {
                let vector = vectors
                    .remove(&request.id)
                    .ok_or(IndexError::MissingEmbedding(request.id))?;
                Ok(DocumentObject {
                    page: request.id,
                    text: request.text,
                    vector,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let dimension = documents[0].vector.len() as u64;
        self.store
            .ensure_collection(&self.collection, dimension)
            .await
            .map_err(|source| IndexError::Collection {
                collection: self.collection.clone(),
                source,
            })?;

        log::info!(
            "storing {} objects in collection {}",
            documents.len(),
            self.collection
        );
        self.store
            .insert_documents(&self.collection, documents)
            .await
            .map_err(IndexError::Store)
    }
}
