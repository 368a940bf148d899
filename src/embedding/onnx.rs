// Sentence embedding provider backed by a local ONNX transformer.
//
// Headers are tokenized with the model's HuggingFace tokenizer, run through
// the exported encoder, and pooled into one vector per header. Pooling mode
// and the presence of a `token_type_ids` input come from the ModelSpec, since
// BERT-style and XLM-RoBERTa-style exports differ there.
//
// The model runs locally via ONNX; no API calls once downloaded.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::download::{model_subdir, ModelSpec, Pooling, MODEL_FILE, TOKENIZER_FILE};
use super::traits::EmbeddingProvider;

/// Texts per inference call. Headers are short, so this keeps padding cheap.
const BATCH_SIZE: usize = 32;

/// Column headers rarely need more than a handful of tokens.
const MAX_TOKENS: usize = 128;

/// Sentence embedder using a local ONNX model.
///
/// `Session::run` takes `&mut self`, hence the Mutex.
pub struct SentenceEmbedder {
    spec: ModelSpec,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceEmbedder {
    /// Load a registered model from `base/<name>/`.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in that directory.
    /// Call `download_models()` first if they don't exist.
    pub fn load(base: &Path, spec: &ModelSpec) -> Result<Self> {
        let dir = model_subdir(base, spec);
        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `colsim download-model --models {}` to download it.",
                model_path.display(),
                spec.name
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `colsim download-model --models {}` to download it.",
                tokenizer_path.display(),
                spec.name
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        // Padding is done by hand below
        tokenizer.with_padding(None);

        debug!(model = spec.name, "Loaded sentence embedding model from {}", dir.display());

        Ok(Self {
            spec: spec.clone(),
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Run one padded batch through the model and pool it.
    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let encodings: Vec<_> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            anyhow::bail!("Tokenizer produced no tokens for any input");
        }

        // input_ids pad with 0, attention_mask marks real tokens,
        // token_type_ids are all zero for single-sentence input.
        let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for enc in &encodings {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let pad_len = max_len - ids.len();

            input_ids_flat.extend(ids.iter().map(|&id| id as i64));
            attention_mask_flat.extend(mask.iter().map(|&m| m as i64));
            input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
        }

        let shape = [batch_size as i64, max_len as i64];

        let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat.clone()))
            .context("Failed to create attention_mask tensor")?;

        // Output 0 is last_hidden_state: [batch, seq_len, hidden]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let run = if self.spec.token_type_ids {
                let token_type_ids_tensor =
                    Tensor::from_array((shape, vec![0i64; batch_size * max_len]))
                        .context("Failed to create token_type_ids tensor")?;
                session.run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
            } else {
                session.run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor
                })
            };
            let outputs = run.context("Embedding ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract embedding output tensor")?;

            data.to_vec()
        };

        let tokens = batch_size * max_len;
        if hidden_states.is_empty() || hidden_states.len() % tokens != 0 {
            anyhow::bail!(
                "Unexpected embedding output size {} for {} tokens",
                hidden_states.len(),
                tokens
            );
        }
        let hidden = hidden_states.len() / tokens;

        let embeddings = match self.spec.pooling {
            Pooling::Mean => mean_pool(
                &hidden_states,
                &attention_mask_flat,
                batch_size,
                max_len,
                hidden,
            ),
            Pooling::Cls => (0..batch_size)
                .map(|i| {
                    let offset = i * max_len * hidden;
                    hidden_states[offset..offset + hidden]
                        .iter()
                        .map(|&x| x as f64)
                        .collect()
                })
                .collect(),
        };

        debug!(
            model = self.spec.name,
            batch_size,
            dim = hidden,
            "Computed sentence embeddings"
        );

        Ok(embeddings)
    }
}

impl EmbeddingProvider for SentenceEmbedder {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }
}

/// Average token embeddings weighted by the attention mask.
///
/// `hidden_states` is a flattened `[batch, max_len, hidden]` tensor and
/// `mask` a flattened `[batch, max_len]` mask.
pub fn mean_pool(
    hidden_states: &[f32],
    mask: &[i64],
    batch_size: usize,
    max_len: usize,
    hidden: usize,
) -> Vec<Vec<f64>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0_f64; hidden];
        let mut mask_sum = 0.0_f64;

        for j in 0..max_len {
            let mask_val = mask[i * max_len + j] as f64;
            if mask_val > 0.0 {
                mask_sum += mask_val;
                let offset = (i * max_len + j) * hidden;
                for (k, s) in sum.iter_mut().enumerate() {
                    *s += hidden_states[offset + k] as f64 * mask_val;
                }
            }
        }

        if mask_sum > 0.0 {
            for val in &mut sum {
                *val /= mask_sum;
            }
        }

        embeddings.push(sum);
    }

    embeddings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::download::find_model;

    #[test]
    fn test_mean_pool_ignores_padding() {
        // batch 1, 3 positions, hidden 2; last position is padding
        let hidden = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = vec![1, 1, 0];
        let pooled = mean_pool(&hidden, &mask, 1, 3, 2);
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_per_row() {
        // batch 2, 2 positions, hidden 1
        let hidden = vec![1.0, 3.0, 5.0, 0.0];
        let mask = vec![1, 1, 1, 0];
        let pooled = mean_pool(&hidden, &mask, 2, 2, 1);
        assert_eq!(pooled, vec![vec![2.0], vec![5.0]]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[1.0, 1.0], &[0, 0], 1, 2, 1);
        assert_eq!(pooled, vec![vec![0.0]]);
    }

    #[test]
    fn test_load_missing_model_mentions_download() {
        let dir = tempfile::tempdir().unwrap();
        let spec = find_model("minilm").unwrap();
        let err = SentenceEmbedder::load(dir.path(), spec).err().unwrap();
        assert!(err.to_string().contains("download-model"), "got: {err}");
    }
}
