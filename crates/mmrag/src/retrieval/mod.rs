//! Index writing and similarity retrieval

mod retriever;
mod writer;

pub use retriever::Retriever;
pub use writer::IndexWriter;
