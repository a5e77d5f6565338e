//! Lazily populated, append-only store of indices, bundles and query
//! embeddings.
//!
//! Each key is filled at most once at a time: concurrent first requests for
//! the same key share one load. A failed load leaves the slot empty so the
//! next request tries again.

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use ayah_core::paths::ResourcePaths;
use ayah_core::traits::{Embedder, VectorIndex};
use ayah_core::{Bundle, Corpus, LangCode, TranslationBundle};

/// Loads a vector index from disk.
#[async_trait]
pub trait IndexLoader: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    async fn load(&self, path: &Path) -> anyhow::Result<Arc<dyn VectorIndex>>;
}

/// Reads LanceDB `vectors` tables into memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct LanceIndexLoader;

#[async_trait]
impl IndexLoader for LanceIndexLoader {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn load(&self, path: &Path) -> anyhow::Result<Arc<dyn VectorIndex>> {
        let index = ayah_vector::open_index(path).await?;
        Ok(Arc::new(index))
    }
}

struct KeyedOnce<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> KeyedOnce<K, V> {
    fn new() -> Self {
        Self { cells: Mutex::new(HashMap::new()) }
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        self.cells.lock().entry(key.clone()).or_default().clone()
    }

    fn get(&self, key: &K) -> Option<V> {
        self.cells.lock().get(key).and_then(|c| c.get().cloned())
    }
}

pub struct ResourceCache {
    paths: ResourcePaths,
    original_lang: LangCode,
    query_prefix: String,
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    loader: Arc<dyn IndexLoader>,
    indexes: KeyedOnce<LangCode, Arc<dyn VectorIndex>>,
    bundles: KeyedOnce<LangCode, Arc<Bundle>>,
    embeddings: KeyedOnce<String, Arc<Vec<f32>>>,
}

impl ResourceCache {
    pub fn new(
        paths: ResourcePaths,
        original_lang: LangCode,
        query_prefix: impl Into<String>,
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        loader: Arc<dyn IndexLoader>,
    ) -> Self {
        Self {
            paths,
            original_lang,
            query_prefix: query_prefix.into(),
            corpus,
            embedder,
            loader,
            indexes: KeyedOnce::new(),
            bundles: KeyedOnce::new(),
            embeddings: KeyedOnce::new(),
        }
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }

    pub fn original_lang(&self) -> &LangCode {
        &self.original_lang
    }

    /// Index for `lang`. A language without its own index maps to the default
    /// index, and that mapping is kept. `None` only when loading fails.
    pub async fn get_index(&self, lang: &LangCode) -> Option<Arc<dyn VectorIndex>> {
        if *lang == self.original_lang {
            return self.default_index().await;
        }
        let cell = self.indexes.cell(lang);
        let loaded = cell
            .get_or_try_init(|| async {
                let path = self.paths.index_path(lang);
                if self.loader.exists(&path) {
                    debug!(lang = %lang, path = %path.display(), "loading index");
                    return self.loader.load(&path).await;
                }
                warn!(lang = %lang, path = %path.display(), "no index for language; using default index");
                self.default_index().await.ok_or_else(|| anyhow!("default index unavailable"))
            })
            .await;
        match loaded {
            Ok(index) => Some(index.clone()),
            Err(e) => {
                error!(lang = %lang, error = %e, "failed to load index");
                None
            }
        }
    }

    async fn default_index(&self) -> Option<Arc<dyn VectorIndex>> {
        let cell = self.indexes.cell(&self.original_lang);
        let loaded = cell
            .get_or_try_init(|| async {
                let path = &self.paths.default_index;
                debug!(path = %path.display(), "loading default index");
                self.loader.load(path).await
            })
            .await;
        match loaded {
            Ok(index) => Some(index.clone()),
            Err(e) => {
                error!(lang = %self.original_lang, path = %self.paths.default_index.display(), error = %e, "failed to load default index");
                None
            }
        }
    }

    /// Translation and tafsir source for `lang`. Missing or unreadable bundles
    /// are not remembered and are retried on the next call.
    pub async fn get_translation_bundle(&self, lang: &LangCode) -> Option<Arc<Bundle>> {
        if let Some(bundle) = self.bundles.get(lang) {
            return Some(bundle);
        }
        let cell = self.bundles.cell(lang);
        let loaded = cell
            .get_or_try_init(|| async {
                if *lang == self.original_lang {
                    return Ok(Arc::new(Bundle::Corpus(self.corpus.clone())));
                }
                let path = self.paths.bundle_file(lang);
                if !path.exists() {
                    return Err(anyhow!("no translation file at {}", path.display()));
                }
                let bundle = TranslationBundle::load(&path).with_context(|| format!("reading {}", path.display()))?;
                debug!(lang = %lang, records = bundle.len(), "loaded translation bundle");
                Ok::<_, anyhow::Error>(Arc::new(Bundle::Translation(bundle)))
            })
            .await;
        match loaded {
            Ok(bundle) => Some(bundle.clone()),
            Err(e) => {
                warn!(lang = %lang, error = %format!("{e:#}"), "translation bundle unavailable");
                None
            }
        }
    }

    /// Memoized by the exact query string. The embedder runs on the blocking
    /// pool with the query prefix prepended.
    pub async fn get_query_embedding(&self, query: &str) -> anyhow::Result<Arc<Vec<f32>>> {
        let key = query.to_string();
        let cell = self.embeddings.cell(&key);
        let embedding = cell
            .get_or_try_init(|| async {
                let embedder = self.embedder.clone();
                let input = ayah_embed::with_prefix(&self.query_prefix, query);
                let mut out = tokio::task::spawn_blocking(move || embedder.embed_batch(&[input])).await??;
                let vector = out.pop().ok_or_else(|| anyhow!("embedder returned no vector"))?;
                debug!(query = %query, dim = vector.len(), "embedded query");
                Ok::<_, anyhow::Error>(Arc::new(vector))
            })
            .await?;
        Ok(embedding.clone())
    }
}
