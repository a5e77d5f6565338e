use crate::types::LangCode;

/// Text to fixed-length vector. Outputs are L2-normalized and deterministic.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Parallel score/id arrays, most similar first. Empty slots carry id `-1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub scores: Vec<f32>,
    pub ids: Vec<i64>,
}

impl SearchHits {
    pub fn iter(&self) -> impl Iterator<Item = (f32, i64)> + '_ {
        self.scores.iter().copied().zip(self.ids.iter().copied())
    }
}

/// Nearest-neighbour index over verse embeddings, one per language.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<SearchHits>;
    fn reconstruct(&self, id: usize) -> anyhow::Result<Vec<f32>>;
    fn reconstruct_many(&self, ids: &[usize]) -> anyhow::Result<Vec<Vec<f32>>> {
        ids.iter().map(|&id| self.reconstruct(id)).collect()
    }
}

pub trait LanguageDetector: Send + Sync {
    /// `None` when the language cannot be identified.
    fn detect(&self, text: &str) -> Option<LangCode>;
}
