//! Prompt templates for answer synthesis

use serde_json::Value;

use crate::types::SearchHit;

const INSTRUCTIONS: &str = "You are a helpful assistant. Use ONLY the provided context snippets to answer the question. \
Cite your sources using numbers in brackets like [1], [2], etc. \
If the answer is not contained in the snippets, reply 'I don't know.'";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Numbered context block, one snippet per hit starting at `[1]`
    pub fn build_context(hits: &[SearchHit]) -> String {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "[{}] {}\nSOURCE: {}\n",
                    i + 1,
                    hit.text,
                    Self::source_label(hit)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Original filename if the payload has one, else the record id
    fn source_label(hit: &SearchHit) -> &str {
        hit.payload
            .get("filename")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&hit.id)
    }

    /// Full prompt for `query` grounded in `hits`
    pub fn build(query: &str, hits: &[SearchHit]) -> String {
        format!(
            "{instructions}\n\nContext:\n{context}\nQuestion: {query}\n\nAnswer in full sentences and cite sources.",
            instructions = INSTRUCTIONS,
            context = Self::build_context(hits),
            query = query,
        )
    }
}
