use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid response format: {0}")]
    Decode(String),
    #[error("Batch of {got} texts exceeds the limit of {limit} per request")]
    BatchTooLarge { limit: usize, got: usize },
    #[error("Expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

/// Text to embed, tagged with the caller's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRequest {
    pub id: usize,
    pub text: String,
}

/// Embedding carrying the identifier of the request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub id: usize,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Non-text content; holds a short description for error reporting.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationResponse {
    pub candidates: Vec<Candidate>,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Embeds every request in a single call. Providers with a per-call cap
    /// reject larger batches with `ProviderError::BatchTooLarge`.
    async fn embed_batch(
        &self,
        requests: &[EmbeddingRequest],
    ) -> Result<Vec<Embedding>, ProviderError>;

    fn model_name(&self) -> &str;
}

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ProviderError>;

    fn model_name(&self) -> &str;
}
