// Loader for the aggregated header CSV.
//
// Layout: the first column (headed "Directory") holds the language code, every
// remaining cell holds one column header seen in that language's tables.
// Rows are ragged; shorter rows simply have fewer cells or trailing blanks.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::HeaderCorpus;

/// Name of the language column in the aggregated CSV.
pub const LANGUAGE_COLUMN: &str = "Directory";

/// Load the per-language header lists from the CSV at `path`.
///
/// Fails if the file can't be read, its first header cell isn't `Directory`,
/// or it contains no language rows. A language row with no header cells is
/// kept with an empty list; the aggregator decides what to do with it.
pub fn load_header_corpus(path: &Path) -> Result<HeaderCorpus> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open header CSV: {}", path.display()))?;

    read_header_corpus(file).with_context(|| format!("Invalid header CSV: {}", path.display()))
}

/// Parse the aggregated CSV from any reader.
pub fn read_header_corpus<R: Read>(reader: R) -> Result<HeaderCorpus> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let first = rdr
        .headers()
        .context("Failed to read CSV header row")?
        .get(0)
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .unwrap_or_default();

    if !first.eq_ignore_ascii_case(LANGUAGE_COLUMN) {
        anyhow::bail!(
            "Expected first column \"{}\", found \"{}\"",
            LANGUAGE_COLUMN,
            first
        );
    }

    let mut corpus = HeaderCorpus::default();

    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", i + 2))?;

        let language = record.get(0).unwrap_or("").trim();
        if language.is_empty() {
            warn!(row = i + 2, "Skipping row with empty language code");
            continue;
        }

        let replaced = corpus.insert(language.to_string(), record.iter().skip(1));
        if replaced {
            warn!(language, "Language appears more than once; using the later row");
        }
    }

    if corpus.is_empty() {
        anyhow::bail!("No language rows found");
    }

    debug!(languages = corpus.len(), "Loaded header corpus");
    Ok(corpus)
}
