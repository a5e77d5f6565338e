//! Persists verse embeddings as a LanceDB `vectors` table.
use anyhow::{ensure, Result};
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::schema::{build_index_schema, INDEX_TABLE};
use crate::table::open_db;

const WRITE_BATCH: usize = 1000;

/// Writes `vectors[i]` under id `i`, replacing whatever index lives at `path`.
pub async fn write_index(path: &Path, dim: usize, vectors: &[Vec<f32>]) -> Result<()> {
	for (i, v) in vectors.iter().enumerate() {
		ensure!(v.len() == dim, "vector {} has dim {} but index dim is {}", i, v.len(), dim);
	}
	if path.exists() {
		std::fs::remove_dir_all(path)?;
	}
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	let db = open_db(path.to_string_lossy().as_ref()).await?;
	let schema = build_index_schema(dim);

	if vectors.is_empty() {
		let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
		db.create_table(INDEX_TABLE, Box::new(iter)).execute().await?;
		info!(path = %path.display(), "wrote empty index");
		return Ok(());
	}

	let pb = ProgressBar::new(vectors.len() as u64);
	pb.set_style(ProgressStyle::default_bar()
		.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} vectors ({percent}%)")?
		.progress_chars("#>-"));
	let mut table = None;
	for (n, chunk) in vectors.chunks(WRITE_BATCH).enumerate() {
		let start = n * WRITE_BATCH;
		let ids = Int64Array::from_iter_values((start..start + chunk.len()).map(|i| i as i64));
		let values = FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
			chunk.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
			dim as i32,
		);
		let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(ids), Arc::new(values)])?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema.clone()));
		match &table {
			None => table = Some(db.create_table(INDEX_TABLE, reader).execute().await?),
			Some(t) => { t.add(reader).execute().await?; }
		}
		pb.inc(chunk.len() as u64);
	}
	pb.finish_and_clear();
	info!(path = %path.display(), vectors = vectors.len(), dim, "wrote index");
	Ok(())
}
