use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use colsim::config::{self, ProviderBackend};
use colsim::embedding::download;
use colsim::output::terminal;
use colsim::pipeline::{self, ReportOptions};

/// colsim: cross-language column header similarity.
///
/// Embeds the column headers scraped from each language's Wikipedia tables,
/// averages them per language, and compares languages by cosine similarity.
#[derive(Parser)]
#[command(name = "colsim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the similarity matrix, heatmap, and comparisons for each provider
    Analyze {
        /// Aggregated header CSV (first column "Directory")
        input: PathBuf,

        /// Comma-separated providers, e.g. "hashing,labse" (default: COLSIM_PROVIDERS)
        #[arg(long)]
        providers: Option<String>,

        /// Output directory (default: COLSIM_OUTPUT_DIR or ./output)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Language pair to list side by side, e.g. en:de (repeatable)
        #[arg(long = "compare")]
        compare: Vec<String>,
    },

    /// Build the aggregated header CSV from a <root>/<lang>/*.csv table corpus
    Aggregate {
        /// Corpus root with one subdirectory per language
        root: PathBuf,

        /// Where to write the aggregated CSV
        #[arg(long, default_value = "aggregated_columns_by_language.csv")]
        output: PathBuf,

        /// Keep each header only once per language
        #[arg(long)]
        dedup: bool,
    },

    /// Download ONNX embedding models
    DownloadModel {
        /// Comma-separated model names (default: all registered models)
        #[arg(long)]
        models: Option<String>,
    },

    /// List registered embedding models and whether they're downloaded
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("colsim=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            providers,
            out,
            compare,
        } => {
            let config = config::Config::load()?;

            let backends = match providers {
                Some(list) => config::parse_provider_list(&list)?,
                None => config.providers.clone(),
            };
            let compare_pairs = compare
                .iter()
                .map(|p| pipeline::parse_pair(p))
                .collect::<Result<Vec<_>>>()?;

            // Malformed input aborts before any provider runs
            let corpus = colsim::corpus::loader::load_header_corpus(&input)?;
            println!(
                "Loaded {} languages from {}",
                corpus.len(),
                input.display()
            );

            let mut options = ReportOptions::new(out.unwrap_or(config.output_dir));
            options.compare_pairs = compare_pairs;

            let outcome = pipeline::run_all(
                backends
                    .iter()
                    .map(|backend| (backend.label(), backend.build(&config.model_dir))),
                &corpus,
                &options,
            );

            for report in &outcome.reports {
                println!("\n{}", format!("=== Provider: {} ===", report.provider).bold());
                terminal::display_matrix(&report.matrix, &report.provider);
                terminal::display_excluded(&report.embeddings.excluded);
                for file in &report.files {
                    println!("  Wrote {}", file.display());
                }
            }
            for (label, e) in &outcome.failures {
                println!("\n{} {}: {:#}", "Error:".red(), label, e);
            }

            if !outcome.all_succeeded() {
                let failed: Vec<&str> = outcome.failures.iter().map(|(l, _)| l.as_str()).collect();
                anyhow::bail!(
                    "{} of {} providers failed: {}",
                    failed.len(),
                    backends.len(),
                    failed.join(", ")
                );
            }
            println!("\n{}", "Analysis complete.".bold());
        }

        Commands::Aggregate {
            root,
            output,
            dedup,
        } => {
            info!(root = %root.display(), dedup, "Aggregating column headers");
            let corpus = colsim::corpus::aggregate::collect_headers(&root, dedup)?;
            colsim::corpus::aggregate::write_header_corpus(&corpus, &output)?;

            for lang in corpus.languages() {
                println!("  {:<8} {:>6} headers", lang.language, lang.headers.len());
            }
            println!(
                "\n{}",
                format!("Aggregated headers saved to: {}", output.display()).bold()
            );
        }

        Commands::DownloadModel { models } => {
            let config = config::Config::load()?;

            let specs: Vec<&download::ModelSpec> = match models {
                Some(list) => list
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|name| -> Result<&'static download::ModelSpec> {
                        match ProviderBackend::parse(name)? {
                            ProviderBackend::Onnx(spec) => Ok(spec),
                            ProviderBackend::Hashing { .. } => {
                                anyhow::bail!("The hashing provider needs no download")
                            }
                        }
                    })
                    .collect::<Result<Vec<_>>>()?,
                None => download::MODELS.iter().collect(),
            };

            println!("Downloading ONNX models...");
            println!("  Destination: {}", config.model_dir.display());

            download::download_models(&config.model_dir, &specs).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `colsim analyze <input> --providers <model>`.");
        }

        Commands::Models => {
            let config = config::Config::load()?;
            println!("Model directory: {}", config.model_dir.display());
            println!(
                "  {:<10} {:<64} {}",
                "hashing",
                "built-in character trigram hashing",
                "available".green()
            );
            for spec in download::MODELS {
                let status = if download::model_files_present(&config.model_dir, spec) {
                    "downloaded".green()
                } else {
                    "not downloaded".dimmed()
                };
                println!("  {:<10} {:<64} {}", spec.name, spec.repo, status);
            }
        }
    }

    Ok(())
}
