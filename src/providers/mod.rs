pub mod gemini;
pub mod traits;

pub use gemini::gemini::GeminiProvider;
pub use traits::{
    Candidate, Embedding, EmbeddingProvider, EmbeddingRequest, GenerationResponse,
    GenerativeProvider, Part, ProviderError,
};
