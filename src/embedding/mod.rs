// Embedding providers: trait-based abstraction for swappable models.
//
// The EmbeddingProvider trait defines the interface. SentenceEmbedder runs a
// local ONNX transformer; HashingEmbedder is a deterministic offline baseline.
// Callers construct providers explicitly and hand them to the pipeline.

pub mod download;
pub mod hashing;
pub mod onnx;
pub mod traits;
