// Language embedding aggregation.
//
// Every header of a language is embedded with one provider call, and the
// language's representative vector is the plain element-wise mean: each
// header counts once, regardless of length or how often it occurs.
//
// Languages without headers get no vector at all. They are recorded in
// `excluded` and never reach the similarity matrix.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::corpus::HeaderCorpus;
use crate::embedding::traits::{EmbeddingError, EmbeddingProvider};

/// Representative vectors for one provider run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageEmbeddings {
    pub provider: String,
    /// Vector length reported by the provider.
    pub dimension: usize,
    /// `(language, mean vector)` in corpus order.
    pub entries: Vec<(String, Vec<f64>)>,
    /// Languages dropped for having no headers.
    pub excluded: Vec<String>,
}

impl LanguageEmbeddings {
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn get(&self, language: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(l, _)| l == language)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute one mean vector per non-empty language.
///
/// Fails if the provider errors, or if its output breaks the shape contract:
/// wrong vector count, empty vectors, mixed dimensionality (within or across
/// languages), or non-finite values.
pub fn aggregate_languages<P>(provider: &P, corpus: &HeaderCorpus) -> Result<LanguageEmbeddings>
where
    P: EmbeddingProvider + ?Sized,
{
    let name = provider.name().to_string();
    let mut dimension: Option<usize> = None;
    let mut entries = Vec::new();
    let mut excluded = Vec::new();

    for lang in corpus.languages() {
        if lang.is_empty() {
            info!(provider = %name, language = %lang.language, "No headers; excluding language");
            excluded.push(lang.language.clone());
            continue;
        }

        let vectors = provider
            .encode(&lang.headers)
            .with_context(|| format!("Provider {} failed on language {}", name, lang.language))?;

        let dim = validate_shape(&name, lang.headers.len(), &vectors, dimension)
            .with_context(|| format!("Invalid embeddings for language {}", lang.language))?;
        dimension = Some(dim);

        debug!(
            provider = %name,
            language = %lang.language,
            headers = lang.headers.len(),
            dim,
            "Embedded language headers"
        );

        entries.push((lang.language.clone(), mean_embedding(&vectors)));
    }

    Ok(LanguageEmbeddings {
        provider: name,
        dimension: dimension.unwrap_or(0),
        entries,
        excluded,
    })
}

/// Check a provider result against the contract and return its dimension.
fn validate_shape(
    provider: &str,
    expected_count: usize,
    vectors: &[Vec<f64>],
    expected_dim: Option<usize>,
) -> Result<usize, EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            provider: provider.to_string(),
            expected: expected_count,
            got: vectors.len(),
        });
    }

    let dim = match expected_dim {
        Some(d) => d,
        None => vectors.first().map(Vec::len).unwrap_or(0),
    };
    if dim == 0 {
        return Err(EmbeddingError::EmptyVector {
            provider: provider.to_string(),
        });
    }

    for v in vectors {
        if v.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                provider: provider.to_string(),
                expected: dim,
                got: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::NonFinite {
                provider: provider.to_string(),
            });
        }
    }

    Ok(dim)
}

/// Element-wise arithmetic mean of equal-length vectors.
///
/// Returns an empty vector for empty input; callers never pass one since
/// empty languages are excluded before embedding.
pub fn mean_embedding(vectors: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };

    let n = vectors.len() as f64;
    let mut mean = vec![0.0_f64; first.len()];

    for v in vectors {
        for (m, &x) in mean.iter_mut().zip(v) {
            *m += x;
        }
    }

    for m in &mut mean {
        *m /= n;
    }

    mean
}
