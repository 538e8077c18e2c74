//! Answer generation with LLM and citation handling

pub mod citation;
pub mod prompt;
mod synthesizer;

pub use citation::{mark_cited, reconstruct_citation, reconstruct_citations};
pub use prompt::PromptBuilder;
pub use synthesizer::Synthesizer;
