use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{Device, DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{XLMRobertaModel, Config as XLMRobertaConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use ayah_core::config::{expand_path, ModelConfig};
use ayah_core::traits::Embedder;

pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                info!(device = "metal", "embedding device selected");
                return dev;
            }
            Err(e) => warn!(error = %e, "metal unavailable; falling back to cpu"),
        }
    }
    info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

/// Prepends the model's instruction tag (`"query: "` / `"passage: "` for e5).
pub fn with_prefix(prefix: &str, text: &str) -> String {
    format!("{prefix}{text}")
}

/// XLM-RoBERTa sentence embedder (multilingual-e5 family): mean pooling over
/// the last hidden state, L2-normalized.
pub struct EmbeddingModel { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl EmbeddingModel {
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        // Two positions are reserved by the RoBERTa position offset.
        let max_len = max_len.min(config.max_position_embeddings.saturating_sub(2)).max(1);
        info!(dim = config.hidden_size, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let enc = tokenize::encode(&self.tokenizer, text, self.max_len, &self.device)?;
        let hidden = self.model.forward(&enc.input_ids, &enc.attention_mask, &enc.token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &enc.attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != self.dim { return Err(anyhow!("dim mismatch: got {} expected {}", emb.len(), self.dim)); }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 250 { warn!(ms = elapsed.as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Prefers `model.safetensors`, falls back to `pytorch_model.bin`.
fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!(file = %safetensors.display(), "reading safetensors weights");
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!(file = %pickle.display(), "reading pickle weights");
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    Err(anyhow!("No model weights found under {}", model_dir.display()))
}

/// Deterministic bag-of-tokens embedder for tests and development.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } } }

impl FakeEmbedder {
    /// Bag of hashed tokens: each token adds a signed weight to one bucket.
    fn vector(&self, text: &str) -> Vec<f32> {
        use std::hash::Hasher; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace().map(str::to_lowercase) {
            let mut hasher = XxHash64::with_seed(0x61796168);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let weight = 0.5 + ((h >> 40) as f32) / ((1u64 << 24) as f32);
            v[(h % self.dim as u64) as usize] += if h & 1 == 0 { weight } else { -weight };
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { v.iter_mut().for_each(|x| *x /= norm); } else { v[0] = 1.0; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}

pub fn get_default_embedder(cfg: &ModelConfig) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if cfg.use_fake || env_fake { info!(dim = cfg.fake_dim, "using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(cfg.fake_dim))); }
    let dir = resolve_model_dir(&cfg.dir)?;
    Ok(Box::new(EmbeddingModel::new(&dir, cfg.max_len)?))
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) { let p = PathBuf::from(&dir); if p.exists() { info!(dir = %p.display(), var, "using model dir from env"); return Ok(p); } }
    }
    let p = expand_path(configured);
    if p.exists() { return Ok(p); }
    Err(anyhow!("Could not locate embedding model directory (tried {})", p.display()))
}
