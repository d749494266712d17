use anyhow::{bail, Result};
use arrow_array::types::{Float32Type, UInt32Type};
use arrow_array::{FixedSizeListArray, ListArray, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::ArrowError;
use std::sync::Arc;

use ragdb_core::types::Point;

use crate::schema::build_arrow_schema;

pub type BatchReader = RecordBatchIterator<std::vec::IntoIter<std::result::Result<RecordBatch, ArrowError>>>;

/// Convert points to one record batch matching [`build_arrow_schema`].
pub fn points_to_record_batch(points: &[Point], dim: usize) -> Result<RecordBatch> {
    let mut ids = Vec::with_capacity(points.len());
    let mut texts = Vec::with_capacity(points.len());
    let mut metadata = Vec::with_capacity(points.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(points.len());
    let mut sparse_indices: Vec<Option<Vec<Option<u32>>>> = Vec::with_capacity(points.len());
    let mut sparse_values: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(points.len());
    for p in points {
        if p.dense.len() != dim {
            bail!("point '{}' has {} dense dims, table expects {}", p.id, p.dense.len(), dim);
        }
        ids.push(p.id.clone());
        texts.push(p.text.clone());
        metadata.push(serde_json::to_string(&p.metadata)?);
        vectors.push(Some(p.dense.iter().map(|&x| Some(x)).collect()));
        match &p.sparse {
            Some(s) => {
                sparse_indices.push(Some(s.indices.iter().map(|&i| Some(i)).collect()));
                sparse_values.push(Some(s.values.iter().map(|&v| Some(v)).collect()));
            }
            None => {
                sparse_indices.push(None);
                sparse_values.push(None);
            }
        }
    }
    let batch = RecordBatch::try_new(
        build_arrow_schema(dim),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim as i32)),
            Arc::new(ListArray::from_iter_primitive::<UInt32Type, _, _>(sparse_indices)),
            Arc::new(ListArray::from_iter_primitive::<Float32Type, _, _>(sparse_values)),
        ],
    )?;
    Ok(batch)
}

pub fn batch_reader(batch: RecordBatch) -> Box<BatchReader> {
    let schema = batch.schema();
    Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema))
}
