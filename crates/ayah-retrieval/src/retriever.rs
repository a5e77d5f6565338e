use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use ayah_core::traits::VectorIndex;
use ayah_core::types::round_to;
use ayah_core::{Bundle, BundleField, FieldLookup, LangCode, SearchResult};

use crate::cache::ResourceCache;

/// Which payload fields to attach to each result. `None` languages mean the
/// field was not requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    pub include_text: bool,
    pub translation_lang: Option<LangCode>,
    pub tafsir_lang: Option<LangCode>,
}

pub struct Retriever {
    cache: Arc<ResourceCache>,
}

impl Retriever {
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self { cache }
    }

    /// Nearest verses for `query` in `index`. Failures are logged and give an
    /// empty list.
    pub async fn search(&self, query: &str, top_k: usize, index: &dyn VectorIndex, options: &ContentOptions) -> Vec<SearchResult> {
        let start = Instant::now();
        match self.try_search(query, top_k, index, options).await {
            Ok(results) => {
                info!(query = %query, top_k, results = results.len(), ms = start.elapsed().as_millis() as u64, "retrieval done");
                results
            }
            Err(e) => {
                error!(query = %query, error = %e, "retrieval failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str, top_k: usize, index: &dyn VectorIndex, options: &ContentOptions) -> anyhow::Result<Vec<SearchResult>> {
        let embedding = self.cache.get_query_embedding(query).await?;
        let hits = index.search(&embedding, top_k)?;

        let translations = match &options.translation_lang {
            Some(lang) => self.cache.get_translation_bundle(lang).await,
            None => None,
        };
        let tafsirs = match &options.tafsir_lang {
            Some(lang) => self.cache.get_translation_bundle(lang).await,
            None => None,
        };

        let corpus = self.cache.corpus();
        let mut results = Vec::with_capacity(hits.ids.len());
        for (score, id) in hits.iter() {
            let Some(verse) = usize::try_from(id).ok().and_then(|pos| corpus.get(pos)) else {
                continue;
            };
            let (surah, ayah) = verse.key();
            results.push(SearchResult {
                surah,
                ayah,
                score: round_to(score, 2),
                text: options.include_text.then(|| verse.text.clone()),
                translation: options
                    .translation_lang
                    .as_ref()
                    .and_then(|_| payload(translations.as_deref(), surah, ayah, BundleField::Translation)),
                tafsir: options
                    .tafsir_lang
                    .as_ref()
                    .and_then(|_| payload(tafsirs.as_deref(), surah, ayah, BundleField::Tafsir)),
                context_links: None,
            });
        }
        Ok(results)
    }
}

fn payload(bundle: Option<&Bundle>, surah: u32, ayah: u32, field: BundleField) -> Option<String> {
    bundle
        .map_or(FieldLookup::NotFound, |b| b.lookup(surah, ayah, field))
        .into_payload(field)
}
