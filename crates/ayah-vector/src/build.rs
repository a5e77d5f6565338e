use anyhow::{ensure, Result};
use std::path::Path;
use tracing::info;

use ayah_core::traits::Embedder;

use crate::writer::write_index;

/// Embeds `prefix + text` for every passage in batches of `batch_size` and
/// writes the result as the index at `path`. Passage `i` gets id `i`.
pub async fn build_index(embedder: &dyn Embedder, texts: &[String], prefix: &str, batch_size: usize, path: &Path) -> Result<usize> {
	let batch_size = batch_size.max(1);
	let mut vectors = Vec::with_capacity(texts.len());
	for batch in texts.chunks(batch_size) {
		let inputs: Vec<String> = batch.iter().map(|t| format!("{prefix}{t}")).collect();
		let embs = embedder.embed_batch(&inputs)?;
		ensure!(embs.len() == inputs.len(), "embedder returned {} vectors for {} inputs", embs.len(), inputs.len());
		vectors.extend(embs);
	}
	write_index(path, embedder.dim(), &vectors).await?;
	info!(path = %path.display(), passages = texts.len(), "built index");
	Ok(vectors.len())
}
