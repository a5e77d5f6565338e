use anyhow::{anyhow, ensure, Result};

use ayah_core::traits::{SearchHits, VectorIndex};

/// Largest number of slots a single search returns.
pub const MAX_SEARCH_K: usize = 1 << 16;

/// Exact inner-product index over row-major `f32` vectors.
///
/// Row `i` has id `i`. Searches return exactly `k` slots (capped at
/// [`MAX_SEARCH_K`]); slots beyond `len()` carry score `-inf` and id `-1`.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
	dim: usize,
	data: Vec<f32>,
}

impl FlatIndex {
	pub fn new(dim: usize) -> Self {
		Self { dim, data: Vec::new() }
	}

	pub fn from_vectors(dim: usize, vectors: &[Vec<f32>]) -> Result<Self> {
		let mut index = Self::new(dim);
		index.data.reserve(dim * vectors.len());
		for v in vectors {
			index.add(v)?;
		}
		Ok(index)
	}

	pub fn add(&mut self, vector: &[f32]) -> Result<()> {
		ensure!(vector.len() == self.dim, "vector dim {} does not match index dim {}", vector.len(), self.dim);
		self.data.extend_from_slice(vector);
		Ok(())
	}

	fn row(&self, id: usize) -> &[f32] {
		&self.data[id * self.dim..(id + 1) * self.dim]
	}
}

impl VectorIndex for FlatIndex {
	fn dim(&self) -> usize { self.dim }

	fn len(&self) -> usize {
		if self.dim == 0 { 0 } else { self.data.len() / self.dim }
	}

	fn search(&self, query: &[f32], k: usize) -> Result<SearchHits> {
		ensure!(query.len() == self.dim, "query dim {} does not match index dim {}", query.len(), self.dim);
		let k = k.min(MAX_SEARCH_K);
		let mut scored: Vec<(f32, usize)> = (0..self.len())
			// `+ 0.0` folds -0.0 into 0.0 so equal scores tie on id.
			.map(|id| (self.row(id).iter().zip(query).map(|(a, b)| a * b).sum::<f32>() + 0.0, id))
			.collect();
		scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
		scored.truncate(k);

		let mut hits = SearchHits { scores: Vec::with_capacity(k), ids: Vec::with_capacity(k) };
		for (score, id) in scored {
			hits.scores.push(score);
			hits.ids.push(id as i64);
		}
		while hits.ids.len() < k {
			hits.scores.push(f32::NEG_INFINITY);
			hits.ids.push(-1);
		}
		Ok(hits)
	}

	fn reconstruct(&self, id: usize) -> Result<Vec<f32>> {
		if id >= self.len() {
			return Err(anyhow!("id {} out of range for index of {} vectors", id, self.len()));
		}
		Ok(self.row(id).to_vec())
	}
}
