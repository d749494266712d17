use ragdb_core::types::{Point, RankedList, Stage};

/// Sort `(score, point)` pairs best-first and keep `top_k`.
///
/// The sort is stable, so equal scores keep the order they were produced in.
pub fn top_k(mut scored: Vec<(f32, &Point)>, top_k: usize, stage: Stage) -> RankedList {
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);
    scored.into_iter().map(|(score, p)| p.to_candidate(score, stage)).collect()
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}
