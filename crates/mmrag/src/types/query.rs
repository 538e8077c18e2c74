//! Query request types

use serde::{Deserialize, Serialize};

/// Query request: `{ "q": "...", "top_k": 5 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    #[serde(alias = "question")]
    pub q: String,

    /// Number of hits to retrieve (default: 5)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl QueryRequest {
    /// Create a request with the default `top_k`
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            top_k: default_top_k(),
        }
    }

    /// Set `top_k`
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
