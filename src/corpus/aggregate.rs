// Build the aggregated header CSV from a scraped table corpus.
//
// Expected layout: `<root>/<lang>/*.csv`, one scraped table per file, with
// the table's column headers in the first record. Each language directory
// contributes one row to the output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::loader::LANGUAGE_COLUMN;
use super::HeaderCorpus;

/// Collect header rows from every `<root>/<lang>/*.csv` table.
///
/// Language directories and table files are visited in name order so the
/// output is stable. Unreadable tables are logged and skipped. With `dedup`
/// each header is kept only once per language (first occurrence wins).
pub fn collect_headers(root: &Path, dedup: bool) -> Result<HeaderCorpus> {
    let mut corpus = HeaderCorpus::default();

    for lang_dir in sorted_entries(root)?.into_iter().filter(|p| p.is_dir()) {
        let language = match lang_dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let tables: Vec<PathBuf> = sorted_entries(&lang_dir)?
            .into_iter()
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "csv"))
            .collect();

        if tables.is_empty() {
            debug!(language = %language, "No tables in language directory");
            continue;
        }

        let mut headers: Vec<String> = Vec::new();
        let mut read_ok = 0usize;
        for table in &tables {
            match read_table_headers(table) {
                Ok(table_headers) => {
                    read_ok += 1;
                    for h in table_headers {
                        if !dedup || !headers.contains(&h) {
                            headers.push(h);
                        }
                    }
                }
                Err(e) => warn!(path = %table.display(), error = %e, "Skipping unreadable table"),
            }
        }

        info!(
            language = %language,
            tables = read_ok,
            headers = headers.len(),
            "Collected column headers"
        );
        corpus.insert(language, headers.iter().map(String::as_str));
    }

    if corpus.is_empty() {
        anyhow::bail!("No language directories with CSV tables under {}", root.display());
    }

    Ok(corpus)
}

/// Write a corpus in the aggregated `Directory,...` layout the loader reads.
///
/// Rows are padded with empty cells to the widest language so the file has
/// a rectangular shape.
pub fn write_header_corpus(corpus: &HeaderCorpus, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let width = corpus
        .languages()
        .iter()
        .map(|l| l.headers.len())
        .max()
        .unwrap_or(0);

    let mut out = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header_row = vec![LANGUAGE_COLUMN.to_string()];
    header_row.extend((1..=width).map(|i| format!("Column {i}")));
    out.write_record(&header_row)?;

    for lang in corpus.languages() {
        let mut row = Vec::with_capacity(width + 1);
        row.push(lang.language.as_str());
        row.extend(lang.headers.iter().map(String::as_str));
        row.resize(width + 1, "");
        out.write_record(&row)?;
    }

    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read only the header record of a scraped table.
fn read_table_headers(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)?;

    Ok(rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .filter(|h| !h.is_empty())
        .collect())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}
