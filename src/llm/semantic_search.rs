use thiserror::Error;

use crate::database::{SearchHit, VectorDBError};
use crate::llm::session::RagSession;
use crate::providers::{GenerationResponse, Part, ProviderError};

/// Number of stored pages retrieved per question.
pub const TOP_K: u64 = 3;
const TEXT_FIELD: &str = "text";

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding query: {0}")]
    Embedding(#[source] ProviderError),
    #[error("searching vector store: {0}")]
    Query(#[source] VectorDBError),
    #[error("decoding search results: {0}")]
    Decode(String),
    #[error("calling generative model: {0}")]
    Generation(#[source] ProviderError),
    #[error("got {0} candidates, expected 1")]
    CandidateCount(usize),
    #[error("bad type of part: {0}")]
    UnsupportedPart(String),
}

/// Fills the résumé question template with the question and retrieved page
/// texts.
pub fn build_prompt(query: &str, contexts: &[String]) -> String {
    format!(
        r#"
I will ask you a question and will provide some additional context information.
Extract key details such as skills, experience, education, and qualifications.
[NEVER SKIP THIS CONTEXT]
Respond to specific questions based on the document.
Provide precise and contextual answers using only the information available.
If a question cannot be answered from the document, reply with:
"The provided document does not contain enough information to answer that question. Please reach out or explore at [github link from text], [Linkedin github link from text] profiles"

Restrictions:
 - Context-Only Responses: Use only the provided document—do not generate or assume missing details.
 - Concise and Clear: Keep responses clear and to the point.

Question:
{}

Context:
{}
"#,
        query,
        contexts.join("\n")
    )
}

/// Every hit must carry a string `text` field.
pub fn decode_texts(hits: Vec<SearchHit>) -> Result<Vec<String>, RagError> {
    hits.into_iter()
        .map(|hit| match hit.payload.get(TEXT_FIELD) {
            Some(serde_json::Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(RagError::Decode(format!(
                "expected string in {} of result {}, got {}",
                TEXT_FIELD, hit.id, other
            ))),
            None => Err(RagError::Decode(format!(
                "{} field missing from result {}",
                TEXT_FIELD, hit.id
            ))),
        })
        .collect()
}

/// Joins the text parts of the single expected candidate.
pub fn candidate_text(response: GenerationResponse) -> Result<String, RagError> {
    let mut candidates = response.candidates;
    if candidates.len() != 1 {
        return Err(RagError::CandidateCount(candidates.len()));
    }

    let mut texts = Vec::new();
    for part in candidates.remove(0).parts {
        match part {
            Part::Text(text) => texts.push(text),
            Part::Other(kind) => return Err(RagError::UnsupportedPart(kind)),
        }
    }
    Ok(texts.join("\n"))
}

impl RagSession {
    /// Answers one question from the stored pages. Each call is independent.
    pub async fn generate_response(&self, query: &str) -> Result<String, RagError> {
        log::debug!("query: {}", query);

        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(RagError::Embedding)?;

        let hits = self
            .store
            .search_vectors(&self.collection, query_vector, TOP_K, &[TEXT_FIELD])
            .await
            .map_err(RagError::Query)?;
        log::debug!("retrieved {} documents", hits.len());

        let contexts = decode_texts(hits)?;
        let prompt = build_prompt(query, &contexts);

        let response = self
            .generator
            .generate(&prompt)
            .await
            .map_err(RagError::Generation)?;

        candidate_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{session, MockEmbedder, MockGenerator, MockStore};
    use crate::providers::Candidate;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_prompt_carries_query_and_retrieved_text() {
        let store = MockStore::with_texts(&["Jane Doe Engineer"]);
        let generator = MockGenerator::answering(&["Engineer"]);
        let rag = session(store.clone(), MockEmbedder::default(), generator.clone());

        let query = "What is the candidate's title?";
        let answer = rag.generate_response(query).await.unwrap();
        assert_eq!(answer, "Engineer");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(query));
        assert!(prompts[0].contains("Jane Doe Engineer"));

        let log = store.log.lock().unwrap();
        assert_eq!(log.queries.len(), 1);
        let (vector, limit, fields) = &log.queries[0];
        assert_eq!(vector, &vec![query.len() as f32, 1.0]);
        assert_eq!(*limit, TOP_K);
        assert_eq!(fields, &vec!["text".to_string()]);
    }

    #[tokio::test]
    async fn test_generation_runs_without_relevance_threshold() {
        let store = MockStore::with_texts(&["unrelated a", "unrelated b", "unrelated c", "unrelated d"]);
        let generator = MockGenerator::answering(&["not in document"]);
        let rag = session(store, MockEmbedder::default(), generator.clone());

        rag.generate_response("favourite colour?").await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("unrelated a\nunrelated b\nunrelated c"));
        assert!(!prompts[0].contains("unrelated d"));
    }

    #[tokio::test]
    async fn test_answer_joins_parts_with_newlines() {
        let rag = session(
            MockStore::with_texts(&["ctx"]),
            MockEmbedder::default(),
            MockGenerator::answering(&["line one", "line two"]),
        );
        assert_eq!(rag.generate_response("q").await.unwrap(), "line one\nline two");
    }

    #[tokio::test]
    async fn test_candidate_count_must_be_one() {
        let generator = MockGenerator::with_response(GenerationResponse {
            candidates: vec![Candidate::default(), Candidate::default()],
        });
        let rag = session(MockStore::with_texts(&["ctx"]), MockEmbedder::default(), generator);

        let err = rag.generate_response("q").await.unwrap_err();
        assert!(matches!(err, RagError::CandidateCount(2)));
        assert_eq!(err.to_string(), "got 2 candidates, expected 1");
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_search() {
        let store = MockStore::with_texts(&["ctx"]);
        let embedder = MockEmbedder {
            fail: true,
            ..Default::default()
        };
        let generator = MockGenerator::answering(&["x"]);
        let rag = session(store.clone(), embedder, generator.clone());

        let err = rag.generate_response("q").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert!(store.log.lock().unwrap().queries.is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_candidate_text_rejects_non_text_part() {
        let response = GenerationResponse {
            candidates: vec![Candidate {
                parts: vec![
                    Part::Text("ok".to_string()),
                    Part::Other("functionCall".to_string()),
                ],
            }],
        };
        assert!(matches!(
            candidate_text(response),
            Err(RagError::UnsupportedPart(kind)) if kind == "functionCall"
        ));
    }

    #[test]
    fn test_candidate_text_rejects_empty_response() {
        assert!(matches!(
            candidate_text(GenerationResponse::default()),
            Err(RagError::CandidateCount(0))
        ));
    }

    #[test]
    fn test_decode_texts_requires_string_text() {
        let hit = |payload: HashMap<String, serde_json::Value>| SearchHit {
            id: "p1".to_string(),
            score: 0.9,
            payload,
        };

        let ok = decode_texts(vec![hit(HashMap::from([("text".to_string(), json!("Jane"))]))]);
        assert_eq!(ok.unwrap(), vec!["Jane".to_string()]);

        let wrong_type = decode_texts(vec![hit(HashMap::from([("text".to_string(), json!(3))]))]);
        assert!(matches!(wrong_type, Err(RagError::Decode(_))));

        let missing = decode_texts(vec![hit(HashMap::new())]);
        assert!(matches!(missing, Err(RagError::Decode(_))));
    }

    #[test]
    fn test_build_prompt_layout() {
        let prompt = build_prompt("Where did she study?", &["page one".to_string(), "page two".to_string()]);
        assert!(prompt.contains("Question:\nWhere did she study?\n"));
        assert!(prompt.contains("Context:\npage one\npage two\n"));
    }
}
