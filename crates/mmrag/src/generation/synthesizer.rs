//! Answer synthesis over retrieved hits

use std::sync::Arc;

use crate::error::Error;
use crate::providers::{DocumentStore, LlmProvider};
use crate::types::{SearchHit, Synthesis};

use super::citation::{mark_cited, reconstruct_citations};
use super::prompt::PromptBuilder;

/// Builds the prompt, asks the LLM and attaches citations.
///
/// LLM failures do not fail the query: the answer carries the error text and
/// the citations are still returned.
pub struct Synthesizer {
    llm: Arc<dyn LlmProvider>,
    documents: Arc<dyn DocumentStore>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { llm, documents }
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub async fn synthesize(&self, query: &str, hits: &[SearchHit]) -> Synthesis {
        let prompt = PromptBuilder::build(query, hits);
        let mut citations = reconstruct_citations(hits, self.documents.as_ref());

        let answer = match self.llm.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(model = self.llm.model(), "Answer generation failed: {}", e);
                match e {
                    Error::Llm(message) => format!("LLM error: {}", message),
                    other => format!("LLM error: {}", other),
                }
            }
        };

        mark_cited(&answer, &mut citations);

        Synthesis {
            answer,
            citations,
            prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::providers::LocalDocumentStore;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    fn synthesizer(answer: Option<&str>) -> (TempDir, Synthesizer) {
        let dir = tempfile::tempdir().unwrap();
        let documents = Arc::new(LocalDocumentStore::new(dir.path(), "http://localhost/storage").unwrap());
        let llm = Arc::new(CannedLlm(answer.map(str::to_string)));
        (dir, Synthesizer::new(llm, documents))
    }

    /// Returns the canned answer, or fails like an unreachable server
    struct CannedLlm(Option<String>);

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .clone()
                .ok_or_else(|| Error::llm("connection refused"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.0.is_some())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn hits() -> Vec<SearchHit> {
        vec![
            SearchHit {
                id: "r1".to_string(),
                score: 0.9,
                text: "Paris is the capital of France.".to_string(),
                payload: json!({"filename": "france.pdf", "doc_id": "d1", "page_number": 1}),
            },
            SearchHit {
                id: "r2".to_string(),
                score: 0.4,
                text: "Lyon is in France.".to_string(),
                payload: json!({"filename": "france.pdf", "doc_id": "d1", "page_number": 4}),
            },
        ]
    }

    #[tokio::test]
    async fn test_synthesis_marks_cited_sources() {
        let (_dir, synthesizer) = synthesizer(Some("The capital is Paris [1]."));

        let synthesis = synthesizer.synthesize("What is the capital?", &hits()).await;
        assert_eq!(synthesis.answer, "The capital is Paris [1].");
        assert_eq!(synthesis.citations.len(), 2);
        assert!(synthesis.citations[0].cited);
        assert!(!synthesis.citations[1].cited);
        assert_eq!(
            synthesis.citations[0].file_path.as_deref(),
            Some("http://localhost/storage/d1.pdf")
        );
        assert!(synthesis.prompt.contains("[2] Lyon is in France."));
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_answer_text() {
        let (_dir, synthesizer) = synthesizer(None);

        let synthesis = synthesizer.synthesize("q", &hits()).await;
        assert_eq!(synthesis.answer, "LLM error: connection refused");
        assert_eq!(synthesis.citations.len(), 2);
    }
}
