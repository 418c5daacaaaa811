pub mod embeddings;
pub mod semantic_search;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use embeddings::IndexError;
pub use semantic_search::{build_prompt, RagError, TOP_K};
pub use session::{RagSession, SessionError};
