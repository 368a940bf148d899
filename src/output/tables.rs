// CSV reports: the labelled similarity matrix and side-by-side header
// listings for hand-picked language pairs.

use std::path::Path;

use anyhow::{Context, Result};

use crate::corpus::HeaderCorpus;
use crate::similarity::SimilarityMatrix;

/// Decimal places used for matrix values.
pub const MATRIX_PRECISION: usize = 4;

/// Write the matrix as CSV: an empty corner cell, language codes across the
/// header row and down the first column, values to MATRIX_PRECISION places.
pub fn write_matrix_csv(matrix: &SimilarityMatrix, path: &Path) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = Vec::with_capacity(matrix.dimension() + 1);
    header.push(String::new());
    header.extend(matrix.languages().iter().cloned());
    out.write_record(&header)?;

    for (lang, row) in matrix.languages().iter().zip(matrix.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(lang.clone());
        record.extend(row.iter().map(|v| format_value(*v)));
        out.write_record(&record)?;
    }

    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Format a similarity value, normalizing negative zero.
fn format_value(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{:.*}", MATRIX_PRECISION, v)
}

/// Header lists of two languages in adjacent columns, the shorter one padded
/// with empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnComparison {
    pub left: String,
    pub right: String,
    pub rows: Vec<(String, String)>,
}

impl ColumnComparison {
    /// Build the listing, or None if either language isn't in the corpus.
    pub fn build(corpus: &HeaderCorpus, left: &str, right: &str) -> Option<Self> {
        let l = &corpus.get(left)?.headers;
        let r = &corpus.get(right)?.headers;
        let len = l.len().max(r.len());

        let cell = |v: &[String], i: usize| v.get(i).cloned().unwrap_or_default();
        let rows = (0..len).map(|i| (cell(l, i), cell(r, i))).collect();

        Some(Self {
            left: left.to_string(),
            right: right.to_string(),
            rows,
        })
    }

    /// Column names: `<lang>_columns`.
    pub fn column_names(&self) -> [String; 2] {
        [
            format!("{}_columns", self.left),
            format!("{}_columns", self.right),
        ]
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        out.write_record(self.column_names())?;
        for (l, r) in &self.rows {
            out.write_record([l, r])?;
        }

        out.flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
