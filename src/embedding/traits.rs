// Embedding provider trait: the swap-ready abstraction.
//
// Any model that maps strings to fixed-length vectors can sit behind this
// trait. The pipeline only checks the shape of what comes back, never the
// quality.

use anyhow::Result;
use thiserror::Error;

/// Contract violations detected in a provider's output.
#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("provider {provider} returned {got} vectors for {expected} inputs")]
    CountMismatch {
        provider: String,
        expected: usize,
        got: usize,
    },

    #[error("provider {provider} returned an empty vector")]
    EmptyVector { provider: String },

    #[error("provider {provider} returned a {got}-dim vector, expected {expected}")]
    DimensionMismatch {
        provider: String,
        expected: usize,
        got: usize,
    },

    #[error("provider {provider} returned a non-finite value")]
    NonFinite { provider: String },
}

/// Trait for turning header strings into embedding vectors.
pub trait EmbeddingProvider {
    /// Label used for output directories, titles, and logs.
    fn name(&self) -> &str;

    /// Encode each text into a vector, returning results in input order.
    /// All vectors from one provider instance have the same length.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        (**self).encode(texts)
    }
}
