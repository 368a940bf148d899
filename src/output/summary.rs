// Machine-readable run summary (summary.json).
//
// Holds everything needed to reproduce the report tables without re-running
// the provider. No timestamps: identical input gives identical bytes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::HeaderCorpus;
use crate::similarity::{LanguageEmbeddings, SimilarityMatrix};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub language: String,
    pub header_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub provider: String,
    pub dimension: usize,
    pub languages: Vec<LanguageSummary>,
    /// Languages left out of the matrix for having no headers.
    pub excluded: Vec<String>,
    /// Row-major, in `languages` order.
    pub matrix: Vec<Vec<f64>>,
}

impl RunSummary {
    pub fn new(
        corpus: &HeaderCorpus,
        embeddings: &LanguageEmbeddings,
        matrix: &SimilarityMatrix,
    ) -> Self {
        let languages = matrix
            .languages()
            .iter()
            .map(|l| LanguageSummary {
                language: l.clone(),
                header_count: corpus.get(l).map(|h| h.headers.len()).unwrap_or(0),
            })
            .collect();

        Self {
            provider: embeddings.provider.clone(),
            dimension: embeddings.dimension,
            languages,
            excluded: embeddings.excluded.clone(),
            matrix: matrix.rows().to_vec(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
