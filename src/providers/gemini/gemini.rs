use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::providers::traits::{
    Candidate, Embedding, EmbeddingProvider, EmbeddingRequest, GenerationResponse,
    GenerativeProvider, Part, ProviderError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Most requests `batchEmbedContents` accepts in one call.
pub const MAX_BATCH_EMBED: usize = 100;

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

impl<'a> RequestContent<'a> {
    fn text(role: Option<&'a str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![RequestPart { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: RequestContent<'a>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl From<GenerateContentResponse> for GenerationResponse {
    fn from(response: GenerateContentResponse) -> Self {
        let candidates = response
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                parts: candidate
                    .content
                    .map(|content| content.parts)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|part| match part.text {
                        Some(text) => Part::Text(text),
                        None => {
                            let mut kinds: Vec<_> = part.other.into_keys().collect();
                            kinds.sort();
                            Part::Other(kinds.join(","))
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { candidates }
    }
}

/// Google Generative Language REST client serving both the generative model
/// and the embedding model.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        embedding_model: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            embedding_model,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model_resource(model), method)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, ProviderError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status,
            message: api_error_message(&body),
        })
    }
}

/// `text-embedding-004` -> `models/text-embedding-004`; already-qualified
/// names are kept as they are.
fn model_resource(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.is_empty() => "empty response body".to_string(),
        Err(_) => body.to_string(),
    }
}

fn pair_embeddings(
    requests: &[EmbeddingRequest],
    embeddings: Vec<ContentEmbedding>,
) -> Result<Vec<Embedding>, ProviderError> {
    // The batch endpoint answers in request order and carries no ids of its own.
    if embeddings.len() != requests.len() {
        return Err(ProviderError::CountMismatch {
            expected: requests.len(),
            got: embeddings.len(),
        });
    }

    Ok(requests
        .iter()
        .zip(embeddings)
        .map(|(request, embedding)| Embedding {
            id: request.id,
            values: embedding.values,
        })
        .collect())
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let model = model_resource(&self.embedding_model);
        let body = EmbedContentRequest {
            model: &model,
            content: RequestContent::text(None, text),
        };

        let response: EmbedContentResponse = self
            .post(&self.endpoint(&self.embedding_model, "embedContent"), &body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(response.embedding.values)
    }

    async fn embed_batch(
        &self,
        requests: &[EmbeddingRequest],
    ) -> Result<Vec<Embedding>, ProviderError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        if requests.len() > MAX_BATCH_EMBED {
            return Err(ProviderError::BatchTooLarge {
                limit: MAX_BATCH_EMBED,
                got: requests.len(),
            });
        }

        let model = model_resource(&self.embedding_model);
        let body = BatchEmbedContentsRequest {
            requests: requests
                .iter()
                .map(|request| EmbedContentRequest {
                    model: &model,
                    content: RequestContent::text(None, &request.text),
                })
                .collect(),
        };

        log::info!(
            "invoking embedding model {} with {} documents",
            self.embedding_model,
            requests.len()
        );
        let response: BatchEmbedContentsResponse = self
            .post(&self.endpoint(&self.embedding_model, "batchEmbedContents"), &body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        pair_embeddings(requests, response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent::text(Some("user"), prompt)],
        };

        let response: GenerateContentResponse = self
            .post(&self.endpoint(&self.model, "generateContent"), &body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(response.into())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
