// Colored terminal output for similarity matrices.

use colored::Colorize;

use crate::similarity::SimilarityMatrix;

/// Print the matrix as an aligned table with colour-coded cells.
pub fn display_matrix(matrix: &SimilarityMatrix, provider: &str) {
    println!(
        "\n{}",
        format!("=== Column Header Similarity ({provider}) ===").bold()
    );

    if matrix.dimension() == 0 {
        println!("  No languages with headers.");
        return;
    }

    let width = matrix
        .languages()
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    print!("  {:<width$}", "");
    for lang in matrix.languages() {
        print!(" {:>width$}", lang.dimmed());
    }
    println!();

    for (lang, row) in matrix.languages().iter().zip(matrix.rows()) {
        print!("  {:<width$}", lang.bold());
        for &v in row {
            let cell = format!("{v:>width$.4}");
            print!(" {}", colorize_similarity(v, &cell));
        }
        println!();
    }

    if let Some((a, b, sim)) = matrix.ranked_pairs().first() {
        println!(
            "\n  Most similar pair: {} / {} ({:.4})",
            a.bold(),
            b.bold(),
            sim
        );
    }
}

/// Print the languages that were left out of a provider's matrix.
pub fn display_excluded(excluded: &[String]) {
    if excluded.is_empty() {
        return;
    }
    println!(
        "  {} excluded (no headers): {}",
        "Note:".yellow(),
        excluded.join(", ")
    );
}

fn colorize_similarity(v: f64, text: &str) -> String {
    if v >= 0.8 {
        text.red().to_string()
    } else if v >= 0.5 {
        text.yellow().to_string()
    } else {
        text.blue().to_string()
    }
}
