//! End-to-end search: language detection, index selection, retrieval,
//! low-confidence fallback and context linking.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use ayah_core::config::{AppConfig, PolicyConfig};
use ayah_core::paths::ResourcePaths;
use ayah_core::traits::{LanguageDetector, VectorIndex};
use ayah_core::{Corpus, Error, LangCode, Result, SearchRequest, SearchResponse, SearchResult};

use crate::cache::{LanceIndexLoader, ResourceCache};
use crate::context::{ContextLinker, ContextParams};
use crate::lang::WhatlangDetector;
use crate::retriever::{ContentOptions, Retriever};

pub struct SearchService {
    cache: Arc<ResourceCache>,
    retriever: Retriever,
    linker: ContextLinker,
    detector: Arc<dyn LanguageDetector>,
    policy: PolicyConfig,
}

impl SearchService {
    pub fn new(cache: Arc<ResourceCache>, detector: Arc<dyn LanguageDetector>, policy: PolicyConfig) -> Self {
        Self {
            retriever: Retriever::new(cache.clone()),
            linker: ContextLinker::new(cache.corpus().clone()),
            cache,
            detector,
            policy,
        }
    }

    /// Loads the corpus and embedder described by `app`; indices and bundles
    /// are loaded on first use.
    pub fn from_config(app: &AppConfig) -> anyhow::Result<Self> {
        let paths = ResourcePaths::from_config(&app.data);
        let corpus = Corpus::load(&paths.corpus_file)
            .map_err(|e| anyhow::anyhow!("loading corpus {}: {e}", paths.corpus_file.display()))?;
        info!(verses = corpus.len(), corpus = %paths.corpus_file.display(), "corpus loaded");
        let embedder = ayah_embed::get_default_embedder(&app.model)?;
        let cache = ResourceCache::new(
            paths,
            app.policy.original_lang.clone(),
            app.model.query_prefix.clone(),
            Arc::new(corpus),
            Arc::from(embedder),
            Arc::new(LanceIndexLoader),
        );
        Ok(Self::new(Arc::new(cache), Arc::new(WhatlangDetector::new(app.policy.min_detect_confidence)), app.policy.clone()))
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Detected language of `query`, or the fallback language.
    pub fn detect_language(&self, query: &str) -> LangCode {
        match self.detector.detect(query) {
            Some(lang) => lang,
            None => {
                debug!(fallback = %self.policy.fallback_lang, "language not detected; using fallback");
                self.policy.fallback_lang.clone()
            }
        }
    }

    /// Bounds checks plus availability of any fixed language.
    pub fn validate(&self, request: &SearchRequest) -> Result<()> {
        request.validate()?;
        let original = self.cache.original_lang();
        for lang in request.fixed_languages() {
            if !self.cache.paths().is_supported(original, lang) {
                let supported = self.cache.paths().supported_settings(original).join(", ");
                return Err(Error::InvalidRequest(format!("unsupported language '{lang}' (supported: {supported})")));
            }
        }
        Ok(())
    }

    /// Fails only on a malformed request. Missing resources degrade to
    /// fallbacks or to an empty result list.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate()?;
        let start = Instant::now();
        let detected = self.detect_language(&request.query);
        let settings = &request.settings;
        let translation_lang = settings.translation_lang.resolve(&detected);
        let tafsir_lang = settings.tafsir_lang.resolve(&detected);
        let options = ContentOptions {
            include_text: settings.include_text,
            translation_lang: settings.include_translation.then(|| translation_lang.clone()),
            tafsir_lang: settings.include_tafsir.then(|| tafsir_lang.clone()),
        };

        let primary = translation_lang;
        let original = self.cache.original_lang().clone();
        let original_first = self.policy.is_original_first(&primary);
        let first_lang = if original_first { &original } else { &primary };
        let Some(mut index) = self.index_or_default(first_lang, &original).await else {
            error!(lang = %first_lang, original = %original, operation = "search", "no usable index; returning no results");
            return Ok(SearchResponse { query: request.query.clone(), detected_lang: detected, results: Vec::new() });
        };
        let mut results = self.retriever.search(&request.query, request.top_k, index.as_ref(), &options).await;

        if original_first {
            let mean = mean_score(&results);
            if mean < self.policy.confidence_threshold {
                info!(lang = %primary, mean, threshold = self.policy.confidence_threshold, "low confidence; retrying with translation index");
                if let Some(alt) = self.cache.get_index(&primary).await {
                    results = self.retriever.search(&request.query, request.top_k, alt.as_ref(), &options).await;
                    index = alt;
                }
            }
        }

        if request.context.enable_context_links && !results.is_empty() {
            let params = ContextParams::from(&request.context);
            for result in &mut results {
                result.context_links = Some(self.linker.build_context(result.surah, result.ayah, index.as_ref(), &params));
            }
        }

        info!(
            detected = %detected,
            primary = %primary,
            results = results.len(),
            ms = start.elapsed().as_millis() as u64,
            "search done"
        );
        Ok(SearchResponse { query: request.query.clone(), detected_lang: detected, results })
    }

    async fn index_or_default(&self, lang: &LangCode, original: &LangCode) -> Option<Arc<dyn VectorIndex>> {
        if let Some(index) = self.cache.get_index(lang).await {
            return Some(index);
        }
        if lang == original {
            return None;
        }
        warn!(lang = %lang, "index unavailable; using original-language index");
        self.cache.get_index(original).await
    }
}

fn mean_score(results: &[SearchResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32
}
