// Model registry and download helper for ONNX sentence embedders.
//
// Three multilingual sentence-transformers models are known by short name.
// Each is stored in its own subdirectory of the model directory
// (~/.local/share/colsim/models/<name>/ on Linux) as `model.onnx` plus
// `tokenizer.json`, so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// How token embeddings are reduced to one sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    /// Attention-mask weighted mean over tokens.
    Mean,
    /// First ([CLS]) token.
    Cls,
}

/// A downloadable embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Short name used on the command line and as the output directory.
    pub name: &'static str,
    /// HuggingFace repository id.
    pub repo: &'static str,
    pub pooling: Pooling,
    /// Whether the exported graph has a `token_type_ids` input.
    /// XLM-RoBERTa based models don't.
    pub token_type_ids: bool,
    /// Rough size of model.onnx, for the download message.
    pub approx_size: &'static str,
}

/// Files every model directory must contain.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where model.onnx lives inside a HuggingFace sentence-transformers repo.
const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";

/// Known multilingual models.
pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "labse",
        repo: "sentence-transformers/LaBSE",
        // The ONNX export stops at the encoder; LaBSE's Dense + Normalize
        // head is not applied, so vectors approximate the
        // sentence-transformers output rather than match it.
        pooling: Pooling::Cls,
        token_type_ids: true,
        approx_size: "~1.8 GB",
    },
    ModelSpec {
        name: "xlm-r",
        repo: "sentence-transformers/xlm-r-bert-base-nli-stsb-mean-tokens",
        pooling: Pooling::Mean,
        token_type_ids: false,
        approx_size: "~1.1 GB",
    },
    ModelSpec {
        name: "minilm",
        repo: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2",
        pooling: Pooling::Mean,
        token_type_ids: true,
        approx_size: "~470 MB",
    },
];

/// Look up a registered model by short name (case-insensitive).
pub fn find_model(name: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/colsim/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("colsim")
        .join("models")
}

/// Subdirectory within `base` for one model.
pub fn model_subdir(base: &Path, spec: &ModelSpec) -> PathBuf {
    base.join(spec.name)
}

/// Check whether both files for a model exist.
pub fn model_files_present(base: &Path, spec: &ModelSpec) -> bool {
    let dir = model_subdir(base, spec);
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Download the given models into `base`.
///
/// Shows a progress bar for model weights. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_models(base: &Path, specs: &[&ModelSpec]) -> Result<()> {
    for spec in specs {
        let dir = model_subdir(base, spec);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

        println!("\n{} ({}):", spec.name, spec.repo);
        let base_url = format!("https://huggingface.co/{}/resolve/main", spec.repo);

        let tokenizer_path = dir.join(TOKENIZER_FILE);
        if tokenizer_path.exists() {
            info!(model = spec.name, "Tokenizer already exists, skipping");
            println!("  {} (already exists)", TOKENIZER_FILE);
        } else {
            println!("  Downloading {}...", TOKENIZER_FILE);
            download_file(
                &format!("{}/{}", base_url, TOKENIZER_FILE),
                &tokenizer_path,
                false,
            )
            .await?;
        }

        let model_path = dir.join(MODEL_FILE);
        if model_path.exists() {
            info!(model = spec.name, "Model already exists, skipping");
            println!("  {} (already exists)", MODEL_FILE);
        } else {
            println!("  Downloading {} ({})...", MODEL_FILE, spec.approx_size);
            download_file(
                &format!("{}/{}", base_url, REMOTE_MODEL_FILE),
                &model_path,
                true,
            )
            .await?;
        }
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let result = stream_to_file(&mut response, dest, pb.as_ref()).await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result?;

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

/// Pull-based source of body chunks; `None` marks the end.
trait ChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self.chunk().await.context("Failed to read response body")?;
        Ok(chunk.map(|c| c.to_vec()))
    }
}

/// Stream a body into `<dest>.part`, then rename it into place, so an
/// interrupted download never looks complete. The partial file is removed
/// when reading or writing fails.
async fn stream_to_file<S: ChunkSource>(
    source: &mut S,
    dest: &Path,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    let partial = dest.with_extension("part");

    if let Err(e) = write_chunks(source, &partial, pb).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }

    tokio::fs::rename(&partial, dest)
        .await
        .with_context(|| format!("Failed to move {} into place", dest.display()))
}

async fn write_chunks<S: ChunkSource>(
    source: &mut S,
    partial: &Path,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = source.next_chunk().await? {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        written += chunk.len() as u64;
        if let Some(pb) = pb {
            pb.set_position(written);
        }
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to write {}", partial.display()))
}
