use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::embedding::download::{default_model_dir, find_model, ModelSpec, MODELS};
use crate::embedding::hashing::{HashingEmbedder, DEFAULT_DIM};
use crate::embedding::onnx::SentenceEmbedder;
use crate::embedding::traits::EmbeddingProvider;

/// Which embedding backend a provider name refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderBackend {
    /// Offline trigram hashing. Always available.
    Hashing { dim: usize },
    /// Local ONNX sentence-transformers model from the registry.
    Onnx(&'static ModelSpec),
}

impl ProviderBackend {
    /// Resolve a provider name: `hashing`, `hashing:<dim>`, or a model name.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if let Some(rest) = name.strip_prefix("hashing") {
            let dim = match rest.strip_prefix(':') {
                Some(d) => d
                    .parse::<usize>()
                    .ok()
                    .filter(|&d| d > 0)
                    .ok_or_else(|| anyhow::anyhow!("Invalid hashing dimension in \"{name}\""))?,
                None if rest.is_empty() => DEFAULT_DIM,
                None => anyhow::bail!("Unknown provider \"{name}\""),
            };
            return Ok(Self::Hashing { dim });
        }

        match find_model(name) {
            Some(spec) => Ok(Self::Onnx(spec)),
            None => {
                let known: Vec<&str> = MODELS.iter().map(|m| m.name).collect();
                anyhow::bail!(
                    "Unknown provider \"{}\". Use `hashing` or one of: {}",
                    name,
                    known.join(", ")
                )
            }
        }
    }

    /// Construct the provider. ONNX models must already be downloaded.
    pub fn build(&self, model_dir: &std::path::Path) -> Result<Box<dyn EmbeddingProvider>> {
        match self {
            Self::Hashing { dim } => Ok(Box::new(HashingEmbedder::new(*dim))),
            Self::Onnx(spec) => Ok(Box::new(SentenceEmbedder::load(model_dir, spec)?)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Hashing { dim } if *dim == DEFAULT_DIM => "hashing".to_string(),
            Self::Hashing { dim } => format!("hashing:{dim}"),
            Self::Onnx(spec) => spec.name.to_string(),
        }
    }
}

/// Parse a comma-separated provider list, skipping blanks.
pub fn parse_provider_list(list: &str) -> Result<Vec<ProviderBackend>> {
    let backends = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(ProviderBackend::parse)
        .collect::<Result<Vec<_>>>()?;

    if backends.is_empty() {
        anyhow::bail!("No providers configured");
    }
    Ok(backends)
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Command-line
/// flags take precedence over everything here.
pub struct Config {
    /// Directory holding one subdirectory per downloaded model
    pub model_dir: PathBuf,
    /// Parent directory for per-provider reports
    pub output_dir: PathBuf,
    /// Providers to run when none are given on the command line
    pub providers: Vec<ProviderBackend>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default: the platform model directory, `./output`,
    /// and the offline `hashing` provider.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("COLSIM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        let output_dir = env::var("COLSIM_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));

        let providers = match env::var("COLSIM_PROVIDERS") {
            Ok(list) => parse_provider_list(&list)?,
            Err(_) => vec![ProviderBackend::Hashing { dim: DEFAULT_DIM }],
        };

        Ok(Self {
            model_dir,
            output_dir,
            providers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hashing() {
        assert_eq!(
            ProviderBackend::parse("hashing").unwrap(),
            ProviderBackend::Hashing { dim: DEFAULT_DIM }
        );
        assert_eq!(
            ProviderBackend::parse("hashing:64").unwrap(),
            ProviderBackend::Hashing { dim: 64 }
        );
        assert!(ProviderBackend::parse("hashing:0").is_err());
        assert!(ProviderBackend::parse("hashingx").is_err());
    }

    #[test]
    fn test_parse_model_name() {
        match ProviderBackend::parse("LaBSE").unwrap() {
            ProviderBackend::Onnx(spec) => assert_eq!(spec.name, "labse"),
            other => panic!("expected onnx backend, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_lists_known_models() {
        let err = ProviderBackend::parse("bloom").unwrap_err();
        assert!(err.to_string().contains("minilm"), "got: {err}");
    }

    #[test]
    fn test_provider_list() {
        let list = parse_provider_list("hashing, xlm-r,,minilm").unwrap();
        let labels: Vec<String> = list.iter().map(ProviderBackend::label).collect();
        assert_eq!(labels, vec!["hashing", "xlm-r", "minilm"]);
        assert!(parse_provider_list(" , ").is_err());
    }

    #[test]
    fn test_build_onnx_without_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ProviderBackend::parse("minilm").unwrap();
        assert!(backend.build(dir.path()).is_err());
    }

    #[test]
    fn test_build_hashing() {
        let provider = ProviderBackend::Hashing { dim: 32 }
            .build(std::path::Path::new("."))
            .unwrap();
        assert_eq!(provider.name(), "hashing:32");
        assert_eq!(provider.encode(&["Name".to_string()]).unwrap()[0].len(), 32);
    }
}
