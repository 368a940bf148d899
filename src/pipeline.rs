// Similarity pipeline: loader output → per-provider aggregation → matrix →
// report files.
//
// Each provider run is independent. The matrix is computed completely before
// anything is written, so a failing provider leaves no partial output behind.
// run_all keeps going after a provider fails and reports every outcome.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::corpus::HeaderCorpus;
use crate::embedding::traits::EmbeddingProvider;
use crate::output::heatmap::{write_heatmap, ColorScale};
use crate::output::sanitize_file_component;
use crate::output::summary::RunSummary;
use crate::output::tables::{write_matrix_csv, ColumnComparison};
use crate::similarity::{aggregate_languages, LanguageEmbeddings, SimilarityMatrix};

pub const MATRIX_FILE: &str = "similarity_matrix.csv";
pub const HEATMAP_FILE: &str = "heatmap.svg";
pub const SUMMARY_FILE: &str = "summary.json";

/// Where and what to write for each provider.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Parent directory; each provider writes to `<out_dir>/<provider>/`.
    pub out_dir: PathBuf,
    /// Language pairs to list side by side.
    pub compare_pairs: Vec<(String, String)>,
    pub color_scale: ColorScale,
}

impl ReportOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            compare_pairs: Vec::new(),
            color_scale: ColorScale::default(),
        }
    }
}

/// Result of one successful provider run.
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub provider: String,
    pub embeddings: LanguageEmbeddings,
    pub matrix: SimilarityMatrix,
    /// Files written, in write order.
    pub files: Vec<PathBuf>,
}

/// Outcome of running several providers.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub reports: Vec<ProviderReport>,
    /// `(provider, error)` for each provider that failed.
    pub failures: Vec<(String, anyhow::Error)>,
}

impl RunOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compute the similarity matrix for one provider without writing anything.
pub fn compute<P>(
    provider: &P,
    corpus: &HeaderCorpus,
) -> Result<(LanguageEmbeddings, SimilarityMatrix)>
where
    P: EmbeddingProvider + ?Sized,
{
    let embeddings = aggregate_languages(provider, corpus)?;
    let matrix = SimilarityMatrix::from_embeddings(&embeddings);
    Ok((embeddings, matrix))
}

/// Run one provider end to end and write its reports.
pub fn run_provider<P>(
    provider: &P,
    corpus: &HeaderCorpus,
    options: &ReportOptions,
) -> Result<ProviderReport>
where
    P: EmbeddingProvider + ?Sized,
{
    let name = provider.name().to_string();
    info!(provider = %name, languages = corpus.len(), "Running similarity pipeline");

    let (embeddings, matrix) = compute(provider, corpus)?;

    let dir = options.out_dir.join(sanitize_file_component(&name));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let files = write_reports(&dir, &name, corpus, &embeddings, &matrix, options)?;

    info!(
        provider = %name,
        dimension = matrix.dimension(),
        files = files.len(),
        "Provider run complete"
    );

    Ok(ProviderReport {
        provider: name,
        embeddings,
        matrix,
        files,
    })
}

fn write_reports(
    dir: &Path,
    provider: &str,
    corpus: &HeaderCorpus,
    embeddings: &LanguageEmbeddings,
    matrix: &SimilarityMatrix,
    options: &ReportOptions,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let matrix_path = dir.join(MATRIX_FILE);
    write_matrix_csv(matrix, &matrix_path)?;
    files.push(matrix_path);

    let heatmap_path = dir.join(HEATMAP_FILE);
    let title = format!("Column Header Similarity Across Languages ({provider})");
    write_heatmap(matrix, &title, options.color_scale, &heatmap_path)?;
    files.push(heatmap_path);

    for (left, right) in &options.compare_pairs {
        match ColumnComparison::build(corpus, left, right) {
            Some(cmp) => {
                let path = dir.join(format!(
                    "{}_vs_{}_columns.csv",
                    sanitize_file_component(left),
                    sanitize_file_component(right)
                ));
                cmp.write_csv(&path)?;
                files.push(path);
            }
            None => warn!(
                left = %left,
                right = %right,
                "Comparison pair names an unknown language; skipping"
            ),
        }
    }

    let summary_path = dir.join(SUMMARY_FILE);
    RunSummary::new(corpus, embeddings, matrix).write_json(&summary_path)?;
    files.push(summary_path);

    Ok(files)
}

/// A provider as handed to [`run_all`]: its label and the result of loading
/// it.
pub type LoadedProvider = (String, Result<Box<dyn EmbeddingProvider>>);

/// Run every provider in turn. A provider that failed to load or failed to
/// run is logged and recorded, and the remaining providers still run.
///
/// Providers are consumed lazily, so a backend built inside the iterator is
/// dropped before the next one is loaded.
pub fn run_all<I>(providers: I, corpus: &HeaderCorpus, options: &ReportOptions) -> RunOutcome
where
    I: IntoIterator<Item = LoadedProvider>,
{
    let mut outcome = RunOutcome::default();

    for (label, loaded) in providers {
        let result = loaded
            .with_context(|| format!("Failed to load provider {label}"))
            .and_then(|provider| run_provider(provider.as_ref(), corpus, options));

        match result {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                error!(provider = %label, error = %format!("{e:#}"), "Provider run failed");
                outcome.failures.push((label, e));
            }
        }
    }

    outcome
}

/// Parse `en:de` style pair specs.
pub fn parse_pair(spec: &str) -> Result<(String, String)> {
    let (a, b) = spec
        .split_once(':')
        .with_context(|| format!("Invalid language pair \"{spec}\"; expected e.g. en:de"))?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        anyhow::bail!("Invalid language pair \"{spec}\"; expected e.g. en:de");
    }
    Ok((a.to_string(), b.to_string()))
}
