#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use ayah_core::config::PolicyConfig;
use ayah_core::paths::ResourcePaths;
use ayah_core::prepare::write_json;
use ayah_core::traits::{Embedder, VectorIndex};
use ayah_core::{Corpus, LangCode, TranslationRecord, Verse};
use ayah_retrieval::{FixedDetector, IndexLoader, ResourceCache, SearchService};
use ayah_vector::FlatIndex;

/// Corpus positions and their default-index vectors.
pub const VERSES: [(u32, u32, [f32; 3]); 8] = [
    (1, 1, [1.0, 0.0, 0.0]),
    (1, 2, [0.96, 0.28, 0.0]),
    (1, 3, [0.8, 0.6, 0.0]),
    (1, 4, [0.0, 1.0, 0.0]),
    (1, 5, [0.0, 0.0, 1.0]),
    (2, 1, [0.6, 0.8, 0.0]),
    (2, 2, [0.0, 0.6, 0.8]),
    (3, 1, [0.0, 1.0, 0.0]),
];

pub fn lang(code: &str) -> LangCode {
    LangCode::new(code).unwrap()
}

pub fn corpus() -> Corpus {
    Corpus::new(
        VERSES
            .iter()
            .map(|&(surah, ayah, _)| Verse {
                surah,
                ayah,
                text: format!("text {surah}:{ayah}"),
                tafsir: format!("tafsir {surah}:{ayah}"),
                embedding_text: String::new(),
            })
            .collect(),
    )
    .unwrap()
}

pub fn default_vectors() -> Vec<Vec<f32>> {
    VERSES.iter().map(|(_, _, v)| v.to_vec()).collect()
}

/// Answers fixed queries; anything else is an error.
pub struct StaticEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        let vectors = [
            ("query: mercy", vec![1.0, 0.0, 0.0]),
            ("query: patience", vec![0.0, 1.0, 0.0]),
            ("query: weak", vec![0.0, 0.0, -1.0]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { vectors, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for StaticEmbedder {
    fn dim(&self) -> usize { 3 }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().ok_or_else(|| anyhow::anyhow!("unexpected input {t:?}")))
            .collect()
    }
}

/// Serves indices registered in memory under their would-be paths.
#[derive(Default)]
pub struct MemoryLoader {
    indexes: Mutex<HashMap<PathBuf, Arc<FlatIndex>>>,
    pub loads: AtomicUsize,
}

impl MemoryLoader {
    pub fn insert(&self, path: PathBuf, vectors: &[Vec<f32>]) {
        let index = FlatIndex::from_vectors(3, vectors).unwrap();
        self.indexes.lock().unwrap().insert(path, Arc::new(index));
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexLoader for MemoryLoader {
    fn exists(&self, path: &Path) -> bool {
        self.indexes.lock().unwrap().contains_key(path)
    }

    async fn load(&self, path: &Path) -> anyhow::Result<Arc<dyn VectorIndex>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let index = self.indexes.lock().unwrap().get(path).cloned();
        match index {
            Some(index) => Ok(index),
            None => anyhow::bail!("no index at {}", path.display()),
        }
    }
}

pub struct Fixture {
    pub tmp: TempDir,
    pub paths: ResourcePaths,
    pub corpus: Arc<Corpus>,
    pub embedder: Arc<StaticEmbedder>,
    pub loader: Arc<MemoryLoader>,
}

impl Fixture {
    /// Default index over every verse and an English bundle covering 1:1 and 1:2.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ResourcePaths::under(tmp.path());
        let loader = Arc::new(MemoryLoader::default());
        loader.insert(paths.default_index.clone(), &default_vectors());
        let fixture = Self {
            tmp,
            paths,
            corpus: Arc::new(corpus()),
            embedder: Arc::new(StaticEmbedder::new()),
            loader,
        };
        fixture.write_bundle("en", &[(1, 1), (1, 2)]);
        fixture
    }

    /// Same layout but with no default index.
    pub fn without_default_index() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ResourcePaths::under(tmp.path());
        Self {
            tmp,
            paths,
            corpus: Arc::new(corpus()),
            embedder: Arc::new(StaticEmbedder::new()),
            loader: Arc::new(MemoryLoader::default()),
        }
    }

    pub fn write_bundle(&self, code: &str, keys: &[(u32, u32)]) {
        let records: Vec<TranslationRecord> = keys
            .iter()
            .map(|&(surah, ayah)| TranslationRecord {
                surah,
                ayah,
                translation: format!("{code} translation {surah}:{ayah}"),
                tafsir: format!("{code} tafsir {surah}:{ayah}"),
                embedding_text: String::new(),
            })
            .collect();
        write_json(&self.paths.bundle_file(&lang(code)), &records).unwrap();
    }

    pub fn add_index(&self, code: &str, vectors: &[Vec<f32>]) {
        self.loader.insert(self.paths.index_path(&lang(code)), vectors);
    }

    pub fn cache(&self) -> Arc<ResourceCache> {
        Arc::new(ResourceCache::new(
            self.paths.clone(),
            lang("ar"),
            "query: ",
            self.corpus.clone(),
            self.embedder.clone(),
            self.loader.clone(),
        ))
    }

    pub fn service(&self, detected: &str) -> SearchService {
        SearchService::new(self.cache(), Arc::new(FixedDetector::new(lang(detected))), PolicyConfig::default())
    }
}
