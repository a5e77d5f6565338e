//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_DATA__BASE_DIR`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::types::LangCode;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(Path::new("."))
    }

    /// Loads `config*.toml` from `dir`; missing files are skipped.
    pub fn load_in(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wraps an already-assembled figment on top of the built-in defaults.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(AppConfig::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn app(&self) -> anyhow::Result<AppConfig> {
        let app: AppConfig = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?;
        app.policy.validate()?;
        Ok(app)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let use_fake: bool = self.get("model.use_fake").unwrap_or(false);
                if use_fake {
                    anyhow::bail!("model.use_fake must be disabled in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub policy: PolicyConfig,
}

/// On-disk layout. Relative paths resolve against `base_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub base_dir: String,
    pub corpus_file: String,
    pub translations_dir: String,
    pub default_index: String,
    pub translation_index_dir: String,
    pub raw_quran_file: String,
    pub raw_tafsir_dir: String,
    pub raw_translations_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            corpus_file: "data/processed/quran.json".to_string(),
            translations_dir: "data/processed/translations".to_string(),
            default_index: "data/embeddings/quran.lance".to_string(),
            translation_index_dir: "data/embeddings/translations".to_string(),
            raw_quran_file: "data/raw/quran-tanzil.txt".to_string(),
            raw_tafsir_dir: "data/raw/tafsir".to_string(),
            raw_translations_dir: "data/raw/translations".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: String,
    pub batch_size: usize,
    pub max_len: usize,
    pub query_prefix: String,
    pub passage_prefix: String,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: "models/multilingual-e5-base".to_string(),
            batch_size: 32,
            max_len: 512,
            query_prefix: "query: ".to_string(),
            passage_prefix: "passage: ".to_string(),
            use_fake: false,
            fake_dim: 768,
        }
    }
}

/// Language policy of the search orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Language of the corpus and of the default index.
    pub original_lang: LangCode,
    /// Used when query language detection fails.
    pub fallback_lang: LangCode,
    /// Languages whose own indices are searched only after the original one.
    pub original_first_langs: Vec<LangCode>,
    /// Mean score below which the original-first search falls back.
    pub confidence_threshold: f32,
    /// Detections below this confidence count as undetected.
    pub min_detect_confidence: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let code = |c: &str| LangCode(c.to_string());
        Self {
            original_lang: code("ar"),
            fallback_lang: code("en"),
            original_first_langs: vec![code("en"), code("fr")],
            confidence_threshold: 0.5,
            min_detect_confidence: 0.5,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "policy.confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.min_detect_confidence) {
            anyhow::bail!(
                "policy.min_detect_confidence must be within [0, 1], got {}",
                self.min_detect_confidence
            );
        }
        Ok(())
    }

    pub fn is_original_first(&self, lang: &LangCode) -> bool {
        self.original_first_langs.contains(lang)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
