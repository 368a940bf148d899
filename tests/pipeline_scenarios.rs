// Pipeline tests: loader → aggregation → matrix → report files, with
// deterministic stub providers standing in for real models.
//
// Covers the behavioural properties of the analysis: diagonal and symmetry,
// exclusion of header-less languages, similarity ordering, idempotent output,
// and provider-failure isolation.

use std::collections::HashMap;

use anyhow::Result;

use colsim::corpus::loader::read_header_corpus;
use colsim::corpus::HeaderCorpus;
use colsim::embedding::hashing::HashingEmbedder;
use colsim::embedding::traits::{EmbeddingError, EmbeddingProvider};
use colsim::output::sanitize_file_component;
use colsim::pipeline::{
    compute, run_all, run_provider, LoadedProvider, ReportOptions, MATRIX_FILE,
};

/// Provider backed by a fixed lookup table. Unknown strings map to a vector
/// along the last axis.
struct TableProvider {
    name: String,
    table: HashMap<String, Vec<f64>>,
    dim: usize,
}

impl TableProvider {
    fn new(name: &str, entries: &[(&str, Vec<f64>)]) -> Self {
        let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(1);
        Self {
            name: name.to_string(),
            table: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            dim,
        }
    }
}

impl EmbeddingProvider for TableProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts
            .iter()
            .map(|t| {
                self.table.get(t).cloned().unwrap_or_else(|| {
                    let mut v = vec![0.0; self.dim];
                    v[self.dim - 1] = 1.0;
                    v
                })
            })
            .collect())
    }
}

/// Provider that always errors.
struct BrokenProvider;

impl EmbeddingProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f64>>> {
        anyhow::bail!("model backend unavailable")
    }
}

/// Provider whose vector length depends on the input, violating the
/// fixed-dimension contract.
struct RaggedProvider;

impl EmbeddingProvider for RaggedProvider {
    fn name(&self) -> &str {
        "ragged"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| vec![1.0; t.len()]).collect())
    }
}

fn mountain_provider() -> TableProvider {
    TableProvider::new(
        "table",
        &[
            ("Name", vec![1.0, 0.0, 0.0, 0.0]),
            ("Height", vec![0.0, 1.0, 0.0, 0.0]),
            ("Höhe", vec![0.0, 0.98, 0.05, 0.0]),
            ("1", vec![0.0, 0.0, 0.0, 1.0]),
            ("2", vec![0.0, 0.0, 0.1, 1.0]),
        ],
    )
}

// ============================================================
// Matrix properties
// ============================================================

#[test]
fn matched_headers_give_high_similarity() {
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height"]),
        ("de", vec!["Name", "Höhe"]),
    ]);
    let (_, matrix) = compute(&mountain_provider(), &corpus).unwrap();

    assert_eq!(matrix.dimension(), 2);
    assert_eq!(matrix.get("en", "en"), Some(1.0));
    assert_eq!(matrix.get("de", "de"), Some(1.0));
    let sim = matrix.get("en", "de").unwrap();
    assert!(sim > 0.9 && sim < 1.0, "expected 0.9 < sim < 1.0, got {sim}");
    assert_eq!(matrix.get("de", "en"), Some(sim));
}

#[test]
fn empty_language_is_silently_excluded() {
    let corpus = read_header_corpus(
        "Directory,c1,c2\nen,Name,Height\nzh,,\nde,Name,Höhe\n".as_bytes(),
    )
    .unwrap();
    assert_eq!(corpus.len(), 3);

    let (embeddings, matrix) = compute(&mountain_provider(), &corpus).unwrap();
    assert_eq!(matrix.dimension(), corpus.len() - 1);
    assert!(!matrix.languages().iter().any(|l| l == "zh"));
    assert_eq!(embeddings.excluded, vec!["zh"]);
}

#[test]
fn disjoint_pair_scores_below_matched_pair() {
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height"]),
        ("de", vec!["Name", "Höhe"]),
        ("xx", vec!["1", "2"]),
    ]);
    let (_, matrix) = compute(&mountain_provider(), &corpus).unwrap();

    let matched = matrix.get("en", "de").unwrap();
    let disjoint = matrix.get("en", "xx").unwrap();
    assert!(
        disjoint < matched,
        "disjoint {disjoint} should be below matched {matched}"
    );
}

#[test]
fn hashing_matrix_is_symmetric_bounded_with_unit_diagonal() {
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height", "Range", "First ascent"]),
        ("de", vec!["Name", "Höhe", "Gebirge", "Erstbesteigung"]),
        ("zh", vec!["名称", "高度", "山脉"]),
        ("it", vec!["Nome", "Altezza", "Catena"]),
        ("nl", vec!["Naam", "Hoogte", "Gebergte"]),
    ]);
    let (_, matrix) = compute(&HashingEmbedder::default(), &corpus).unwrap();

    let n = matrix.dimension();
    assert_eq!(n, 5);
    for i in 0..n {
        assert!((matrix.rows()[i][i] - 1.0).abs() < 1e-12);
        for j in 0..n {
            let v = matrix.rows()[i][j];
            assert!((-1.0..=1.0).contains(&v), "out of range: {v}");
            assert_eq!(v, matrix.rows()[j][i]);
        }
    }
}

#[test]
fn identical_languages_score_one() {
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height"]),
        ("en-copy", vec!["Height", "Name"]),
    ]);
    let (_, matrix) = compute(&HashingEmbedder::default(), &corpus).unwrap();
    let sim = matrix.get("en", "en-copy").unwrap();
    assert!((sim - 1.0).abs() < 1e-9, "got {sim}");
}

// ============================================================
// Report files
// ============================================================

#[test]
fn run_writes_all_reports() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height", "Range"]),
        ("de", vec!["Name", "Höhe"]),
    ]);
    let mut options = ReportOptions::new(dir.path());
    options.compare_pairs = vec![
        ("en".to_string(), "de".to_string()),
        ("en".to_string(), "fr".to_string()),
    ];

    let report = run_provider(&mountain_provider(), &corpus, &options).unwrap();

    let out = dir.path().join("table");
    assert!(out.join("similarity_matrix.csv").exists());
    assert!(out.join("heatmap.svg").exists());
    assert!(out.join("summary.json").exists());
    assert!(out.join("en_vs_de_columns.csv").exists());
    assert!(!out.join("en_vs_fr_columns.csv").exists());
    assert_eq!(report.files.len(), 4);

    let cmp = std::fs::read_to_string(out.join("en_vs_de_columns.csv")).unwrap();
    assert_eq!(
        cmp,
        "en_columns,de_columns\nName,Name\nHeight,Höhe\nRange,\n"
    );

    let matrix_csv = std::fs::read_to_string(out.join(MATRIX_FILE)).unwrap();
    let first_line = matrix_csv.lines().next().unwrap();
    assert_eq!(first_line, ",en,de");
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height", "Range"]),
        ("de", vec!["Name", "Höhe", "Gebirge"]),
        ("nl", vec!["Naam", "Hoogte"]),
    ]);
    let provider = HashingEmbedder::default();

    run_provider(&provider, &corpus, &ReportOptions::new(dir_a.path())).unwrap();
    run_provider(&provider, &corpus, &ReportOptions::new(dir_b.path())).unwrap();

    for file in ["similarity_matrix.csv", "heatmap.svg", "summary.json"] {
        let a = std::fs::read(dir_a.path().join("hashing").join(file)).unwrap();
        let b = std::fs::read(dir_b.path().join("hashing").join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between runs");
    }
}

// ============================================================
// Provider failures
// ============================================================

#[test]
fn provider_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = HeaderCorpus::from_pairs([("en", vec!["Name"])]);

    let err = run_provider(&BrokenProvider, &corpus, &ReportOptions::new(dir.path())).unwrap_err();
    assert!(format!("{err:#}").contains("model backend unavailable"));
    assert!(!dir.path().join("broken").exists());
}

#[test]
fn shape_violation_is_reported_as_embedding_error() {
    let corpus = HeaderCorpus::from_pairs([("en", vec!["Name", "Height"])]);
    let err = compute(&RaggedProvider, &corpus).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EmbeddingError>(),
        Some(EmbeddingError::DimensionMismatch { .. })
    ));
}

#[test]
fn failing_provider_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = HeaderCorpus::from_pairs([
        ("en", vec!["Name", "Height"]),
        ("de", vec!["Name", "Höhe"]),
    ]);
    let providers: Vec<Box<dyn EmbeddingProvider>> = vec![
        Box::new(BrokenProvider),
        Box::new(mountain_provider()),
        Box::new(RaggedProvider),
        Box::new(HashingEmbedder::new(64)),
    ];

    let outcome = run_all(
        providers.into_iter().map(|p| (p.name().to_string(), Ok(p))),
        &corpus,
        &ReportOptions::new(dir.path()),
    );

    assert!(!outcome.all_succeeded());
    let ok: Vec<&str> = outcome.reports.iter().map(|r| r.provider.as_str()).collect();
    let failed: Vec<&str> = outcome.failures.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(ok, vec!["table", "hashing:64"]);
    assert_eq!(failed, vec!["broken", "ragged"]);
    assert!(dir.path().join("table").join(MATRIX_FILE).exists());
    assert!(dir
        .path()
        .join(sanitize_file_component("hashing:64"))
        .join(MATRIX_FILE)
        .exists());
}

#[test]
fn provider_that_fails_to_load_is_recorded_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = HeaderCorpus::from_pairs([("en", vec!["Name"]), ("de", vec!["Name"])]);
    let providers: Vec<LoadedProvider> = vec![
        (
            "labse".to_string(),
            Err(anyhow::anyhow!("model.onnx not found")),
        ),
        (
            "hashing".to_string(),
            Ok(Box::new(HashingEmbedder::default()) as Box<dyn EmbeddingProvider>),
        ),
    ];

    let outcome = run_all(providers, &corpus, &ReportOptions::new(dir.path()));

    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].provider, "hashing");
    assert_eq!(outcome.failures.len(), 1);
    let (label, err) = &outcome.failures[0];
    assert_eq!(label, "labse");
    let msg = format!("{err:#}");
    assert!(msg.contains("Failed to load provider labse"), "got {msg}");
    assert!(msg.contains("model.onnx not found"), "got {msg}");
    assert!(!dir.path().join("labse").exists());
}
