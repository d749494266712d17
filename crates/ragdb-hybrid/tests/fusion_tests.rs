mod common;

use std::collections::HashSet;

use common::{cand, ids};
use ragdb_core::types::Stage;
use ragdb_hybrid::fusion::{fuse, fuse_lists, pass_through, rrf_contribution};
use ragdb_hybrid::DEFAULT_RRF_K;

fn dense_abc() -> Vec<ragdb_core::types::ScoredCandidate> {
    vec![cand("A", 0.9, Stage::Dense), cand("B", 0.8, Stage::Dense), cand("C", 0.7, Stage::Dense)]
}

fn sparse_ca() -> Vec<ragdb_core::types::ScoredCandidate> {
    vec![cand("C", 5.0, Stage::Sparse), cand("A", 3.0, Stage::Sparse)]
}

#[test]
fn fused_scores_follow_reciprocal_ranks() {
    let fused = fuse(dense_abc(), sparse_ca(), DEFAULT_RRF_K);

    assert_eq!(ids(&fused), vec!["A", "C", "B"]);
    let expected = [1.0 / 61.0 + 1.0 / 62.0, 1.0 / 63.0 + 1.0 / 61.0, 1.0 / 62.0];
    for (candidate, want) in fused.iter().zip(expected) {
        assert!((f64::from(candidate.score) - want).abs() < 1e-6, "{} scored {}", candidate.id, candidate.score);
        assert_eq!(candidate.stage, Stage::Fused);
    }
    assert!((fused[0].score - 0.03252).abs() < 1e-5);
    assert!((fused[1].score - 0.03227).abs() < 1e-5);
}

#[test]
fn union_of_ids_each_exactly_once() {
    let dense = vec![cand("A", 0.9, Stage::Dense), cand("B", 0.5, Stage::Dense), cand("D", 0.1, Stage::Dense)];
    let sparse = vec![cand("E", 9.0, Stage::Sparse), cand("B", 4.0, Stage::Sparse), cand("A", 1.0, Stage::Sparse)];
    let fused = fuse(dense, sparse, 60);

    assert_eq!(fused.len(), 4);
    let unique: HashSet<&str> = ids(&fused).into_iter().collect();
    assert_eq!(unique, HashSet::from(["A", "B", "D", "E"]));
}

#[test]
fn per_id_scores_do_not_depend_on_argument_order() {
    let forward = fuse(dense_abc(), sparse_ca(), 60);
    let reversed = fuse(sparse_ca(), dense_abc(), 60);

    for candidate in &forward {
        let other = reversed.iter().find(|c| c.id == candidate.id).expect("id present in both");
        assert!((candidate.score - other.score).abs() < 1e-9);
    }
}

#[test]
fn larger_k_compresses_the_score_range() {
    let gaps: Vec<f64> = [1u32, 60, 1000].iter().map(|&k| rrf_contribution(k, 0) - rrf_contribution(k, 1)).collect();
    assert!(gaps[0] > gaps[1] && gaps[1] > gaps[2], "gaps: {gaps:?}");

    let fused_small = fuse(dense_abc(), vec![], 1);
    let fused_large = fuse(dense_abc(), vec![], 1000);
    assert!(fused_small[0].score - fused_small[1].score > fused_large[0].score - fused_large[1].score);
}

#[test]
fn empty_inputs_are_not_errors() {
    assert!(fuse(vec![], vec![], 60).is_empty());

    let only_sparse = fuse(vec![], sparse_ca(), 60);
    assert_eq!(ids(&only_sparse), vec!["C", "A"]);

    let only_dense = fuse(dense_abc(), vec![], 60);
    assert_eq!(ids(&only_dense), vec!["A", "B", "C"]);
    assert!((f64::from(only_dense[0].score) - 1.0 / 61.0).abs() < 1e-6);
}

#[test]
fn dense_payload_wins_on_conflict() {
    let mut stale = cand("A", 3.0, Stage::Sparse);
    stale.text = "stale sparse payload".to_string();
    let fused = fuse(vec![cand("A", 0.9, Stage::Dense)], vec![stale], 60);

    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].text, "text A");
}

#[test]
fn equal_scores_keep_first_seen_order() {
    // X and Y both sit at rank 0 of one list.
    let fused = fuse(vec![cand("X", 0.2, Stage::Dense)], vec![cand("Y", 8.0, Stage::Sparse)], 60);
    assert_eq!(ids(&fused), vec!["X", "Y"]);

    let three = fuse_lists(
        [vec![cand("P", 1.0, Stage::Dense)], vec![cand("Q", 1.0, Stage::Sparse)], vec![cand("R", 1.0, Stage::Sparse)]],
        60,
    );
    assert_eq!(ids(&three), vec!["P", "Q", "R"]);
}

#[test]
fn dense_only_passes_scores_through() {
    let fused = pass_through(vec![cand("X", 0.95, Stage::Dense)]);

    assert_eq!(ids(&fused), vec!["X"]);
    assert_eq!(fused[0].score, 0.95);
    assert_eq!(fused[0].stage, Stage::Fused);
    assert!(pass_through(vec![]).is_empty());
}
