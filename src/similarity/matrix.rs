// Pairwise cosine similarity between language vectors.
//
//   cos(a, b) = dot(a, b) / (|a| * |b|)
//
// The matrix is filled from the upper triangle and mirrored, so symmetry is
// exact rather than approximate. Diagonal cells are set to 1.0 directly.
// A zero-magnitude vector has no direction; any cell involving one (its own
// diagonal included) holds ZERO_VECTOR_SIMILARITY.

use serde::Serialize;

use super::aggregate::LanguageEmbeddings;

/// Placeholder for cosine similarity involving a zero-magnitude vector.
pub const ZERO_VECTOR_SIMILARITY: f64 = 0.0;

/// Cosine similarity in [-1, 1].
///
/// Returns ZERO_VECTOR_SIMILARITY when either vector has zero magnitude or
/// the lengths differ. Both vectors are rescaled by their largest component
/// first, so very small or very large magnitudes neither underflow nor
/// overflow.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return ZERO_VECTOR_SIMILARITY;
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return ZERO_VECTOR_SIMILARITY;
    }

    let (mut dot, mut sq_a, mut sq_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        sq_a += x * x;
        sq_b += y * y;
    }

    let sim = dot / (sq_a.sqrt() * sq_b.sqrt());
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0)
    } else {
        ZERO_VECTOR_SIMILARITY
    }
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

/// Square, symmetric similarity matrix labelled by language code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatrix {
    languages: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    /// Build the full matrix over every language in `embeddings`.
    pub fn from_embeddings(embeddings: &LanguageEmbeddings) -> Self {
        let languages: Vec<String> = embeddings.languages().map(str::to_string).collect();
        let vectors: Vec<&[f64]> = embeddings.entries.iter().map(|(_, v)| v.as_slice()).collect();
        let n = vectors.len();

        let mut values = vec![vec![0.0_f64; n]; n];
        for i in 0..n {
            values[i][i] = if max_abs(vectors[i]) == 0.0 {
                ZERO_VECTOR_SIMILARITY
            } else {
                1.0
            };
            for j in (i + 1)..n {
                let sim = cosine_similarity(vectors[i], vectors[j]);
                values[i][j] = sim;
                values[j][i] = sim;
            }
        }

        Self { languages, values }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Number of rows (and columns).
    pub fn dimension(&self) -> usize {
        self.languages.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    fn index_of(&self, language: &str) -> Option<usize> {
        self.languages.iter().position(|l| l == language)
    }

    /// Similarity between two languages, if both are present.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[self.index_of(a)?][self.index_of(b)?])
    }

    /// Off-diagonal pairs `(a, b, similarity)` with `a` before `b`, most
    /// similar first.
    pub fn ranked_pairs(&self) -> Vec<(&str, &str, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.dimension() {
            for j in (i + 1)..self.dimension() {
                pairs.push((
                    self.languages[i].as_str(),
                    self.languages[j].as_str(),
                    self.values[i][j],
                ));
            }
        }
        pairs.sort_by(|x, y| y.2.total_cmp(&x.2));
        pairs
    }
}
