use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Table holding one row per verse, `id` being the verse's corpus position.
pub const INDEX_TABLE: &str = "vectors";

pub fn build_index_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Int64, false),
		Field::new("vector", vector_type(dim), true),
	]))
}

pub fn vector_type(dim: usize) -> DataType {
	DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32)
}

/// Vector width declared by a `vectors` table schema.
pub fn schema_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name("vector").ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dim_round_trips_through_schema() {
		let schema = build_index_schema(768);
		assert_eq!(schema_dim(&schema), Some(768));
		assert_eq!(schema.field(0).name(), "id");
	}
}
