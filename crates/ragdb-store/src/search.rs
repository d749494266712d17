use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, UInt32Type};
use arrow_array::{Array, RecordBatch, StringArray};

use ragdb_core::types::{Meta, Point, ScoredCandidate, SparseVector, Stage};

use crate::schema::{ID, METADATA, SPARSE_INDICES, SPARSE_VALUES, TEXT};

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("missing or mistyped column '{}'", name))
}

fn decode_metadata(raw: &str) -> Result<Meta> {
    if raw.is_empty() { return Ok(Meta::new()); }
    Ok(serde_json::from_str(raw)?)
}

/// Rows of a vector-search batch, scored as `1 - _distance`.
pub fn dense_hits(batch: &RecordBatch) -> Result<Vec<ScoredCandidate>> {
    let ids = string_column(batch, ID)?;
    let texts = string_column(batch, TEXT)?;
    let metas = string_column(batch, METADATA)?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_primitive_opt::<Float32Type>())
        .ok_or_else(|| anyhow!("vector search batch has no _distance column"))?;
    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let score = 1.0 - distances.value(i);
        hits.push(ScoredCandidate::new(ids.value(i), texts.value(i), decode_metadata(metas.value(i))?, score, Stage::Dense));
    }
    Ok(hits)
}

/// Rows of a full-scan batch as points carrying only payload and sparse vector.
pub fn sparse_points(batch: &RecordBatch) -> Result<Vec<Point>> {
    let ids = string_column(batch, ID)?;
    let texts = string_column(batch, TEXT)?;
    let metas = string_column(batch, METADATA)?;
    let indices = batch
        .column_by_name(SPARSE_INDICES)
        .and_then(|c| c.as_list_opt::<i32>())
        .ok_or_else(|| anyhow!("missing or mistyped column '{}'", SPARSE_INDICES))?;
    let values = batch
        .column_by_name(SPARSE_VALUES)
        .and_then(|c| c.as_list_opt::<i32>())
        .ok_or_else(|| anyhow!("missing or mistyped column '{}'", SPARSE_VALUES))?;
    let mut points = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let sparse = if indices.is_null(i) || values.is_null(i) {
            None
        } else {
            let idx = indices.value(i);
            let val = values.value(i);
            let idx = idx.as_primitive_opt::<UInt32Type>().ok_or_else(|| anyhow!("sparse indices are not u32"))?;
            let val = val.as_primitive_opt::<Float32Type>().ok_or_else(|| anyhow!("sparse values are not f32"))?;
            Some(SparseVector { indices: idx.values().to_vec(), values: val.values().to_vec() })
        };
        points.push(Point {
            id: ids.value(i).to_string(),
            dense: Vec::new(),
            sparse,
            text: texts.value(i).to_string(),
            metadata: decode_metadata(metas.value(i))?,
        });
    }
    Ok(points)
}
