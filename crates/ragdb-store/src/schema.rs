use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const ID: &str = "id";
pub const TEXT: &str = "text";
pub const METADATA: &str = "metadata";
pub const VECTOR: &str = "vector";
pub const SPARSE_INDICES: &str = "sparse_indices";
pub const SPARSE_VALUES: &str = "sparse_values";

/// Chunk table: payload, dense vector, and the sparse vector as two parallel lists.
pub fn build_arrow_schema(dim: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID, DataType::Utf8, false),
        Field::new(TEXT, DataType::Utf8, false),
        Field::new(METADATA, DataType::Utf8, false),
        Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
        Field::new(SPARSE_INDICES, DataType::List(Arc::new(Field::new("item", DataType::UInt32, true))), true),
        Field::new(SPARSE_VALUES, DataType::List(Arc::new(Field::new("item", DataType::Float32, true))), true),
    ]))
}
