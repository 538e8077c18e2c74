//! Provider abstractions for the external collaborators
//!
//! The vector store, the store for uploaded originals and the LLM are all
//! reached through traits so the pipeline can run against local mocks.

pub mod document_store;
pub mod llm;
pub mod memory;
pub mod qdrant;
pub mod vector_store;

pub use document_store::{storage_locator, DocumentStore, LocalDocumentStore};
pub use llm::{LlmProvider, OllamaLlm};
pub use memory::MemoryVectorStore;
pub use qdrant::QdrantStore;
pub use vector_store::VectorStore;
