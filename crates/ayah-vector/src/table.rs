//! Opening LanceDB index tables and loading them into memory.
use anyhow::{anyhow, bail, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Int64Type};
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::path::Path;
use tracing::debug;

use crate::flat::FlatIndex;
use crate::schema::{schema_dim, INDEX_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
	Ok(connect(uri).execute().await?)
}

/// Reads the `vectors` table under `path` into a [`FlatIndex`].
///
/// Row ids must be exactly `0..n` so that ids stay aligned with corpus
/// positions.
pub async fn open_index(path: &Path) -> Result<FlatIndex> {
	if !path.exists() {
		bail!("index not found at {}", path.display());
	}
	let db = open_db(path.to_string_lossy().as_ref()).await?;
	let table = db.open_table(INDEX_TABLE).execute().await?;
	let schema = table.schema().await?;
	let dim = schema_dim(&schema).ok_or_else(|| anyhow!("{}: vector column missing or not fixed-size", path.display()))?;

	let mut rows: Vec<(i64, Vec<f32>)> = Vec::new();
	let mut stream = table.query().execute().await?;
	while let Some(batch) = stream.try_next().await? {
		let ids = batch.column_by_name("id")
			.and_then(|c| c.as_primitive_opt::<Int64Type>())
			.ok_or_else(|| anyhow!("{}: id column missing", path.display()))?;
		let vectors = batch.column_by_name("vector")
			.and_then(|c| c.as_fixed_size_list_opt())
			.ok_or_else(|| anyhow!("{}: vector column missing", path.display()))?;
		for i in 0..batch.num_rows() {
			let values = vectors.value(i);
			let values = values.as_primitive::<Float32Type>().values().to_vec();
			rows.push((ids.value(i), values));
		}
	}
	rows.sort_by_key(|(id, _)| *id);

	let mut index = FlatIndex::new(dim);
	for (expected, (id, vector)) in rows.iter().enumerate() {
		if *id != expected as i64 {
			bail!("{}: ids are not contiguous (expected {}, found {})", path.display(), expected, id);
		}
		index.add(vector)?;
	}
	debug!(path = %path.display(), rows = rows.len(), dim, "loaded index");
	Ok(index)
}
