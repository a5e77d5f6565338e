//! Links a verse to semantically close verses in its neighbourhood.

use std::sync::Arc;
use tracing::{debug, warn};

use ayah_core::traits::{SearchHits, VectorIndex};
use ayah_core::types::round_to;
use ayah_core::{ContextLink, ContextSettings, Corpus};
use ayah_vector::FlatIndex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextParams {
    pub window: u32,
    pub similarity_threshold: f32,
    pub max_links: usize,
}

impl From<&ContextSettings> for ContextParams {
    fn from(s: &ContextSettings) -> Self {
        Self { window: s.context_window, similarity_threshold: s.similarity_threshold, max_links: s.max_context_links }
    }
}

pub struct ContextLinker {
    corpus: Arc<Corpus>,
}

impl ContextLinker {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// Verses of the same surah within `window` ayahs whose embedding
    /// similarity to `surah:ayah` reaches the threshold, most similar first.
    ///
    /// Every failure is reported as a single error link.
    pub fn build_context(&self, surah: u32, ayah: u32, index: &dyn VectorIndex, params: &ContextParams) -> Vec<ContextLink> {
        let Some(target) = self.corpus.position(surah, ayah) else {
            return fail(surah, ayah, format!("Verse {surah}:{ayah} not found."));
        };

        let candidates: Vec<usize> = self
            .corpus
            .verses()
            .iter()
            .enumerate()
            .filter(|(pos, v)| *pos != target && v.surah == surah && v.ayah.abs_diff(ayah) <= params.window)
            .map(|(pos, _)| pos)
            .collect();
        if candidates.is_empty() {
            return fail(surah, ayah, format!("No candidate verses found near {surah}:{ayah} within window {}.", params.window));
        }

        let hits = match Self::rank(index, target, &candidates) {
            Ok(hits) => hits,
            Err(e) => return fail(surah, ayah, format!("Failed to reconstruct candidate embeddings: {e}")),
        };

        let links: Vec<ContextLink> = hits
            .iter()
            .filter(|&(score, id)| id >= 0 && score >= params.similarity_threshold)
            .filter_map(|(score, id)| {
                let verse = self.corpus.get(candidates[id as usize])?;
                Some(ContextLink::link(verse.surah, verse.ayah, round_to(score, 3)))
            })
            .take(params.max_links)
            .collect();
        if links.is_empty() {
            return fail(
                surah,
                ayah,
                format!("No verses passed similarity threshold {} for {surah}:{ayah}.", params.similarity_threshold),
            );
        }
        debug!(surah, ayah, links = links.len(), "built context links");
        links
    }

    /// Candidates scored against the target through a transient exact index.
    fn rank(index: &dyn VectorIndex, target: usize, candidates: &[usize]) -> anyhow::Result<SearchHits> {
        let target_vector = index.reconstruct(target)?;
        let local = FlatIndex::from_vectors(index.dim(), &index.reconstruct_many(candidates)?)?;
        local.search(&target_vector, candidates.len())
    }
}

fn fail(surah: u32, ayah: u32, message: String) -> Vec<ContextLink> {
    warn!(surah, ayah, operation = "context", error = %message, "context links unavailable");
    vec![ContextLink::error(message)]
}
