// Cross-language similarity: per-language mean embeddings and the pairwise
// cosine similarity matrix built from them.

pub mod aggregate;
pub mod matrix;

pub use aggregate::{aggregate_languages, mean_embedding, LanguageEmbeddings};
pub use matrix::{cosine_similarity, SimilarityMatrix, ZERO_VECTOR_SIMILARITY};
