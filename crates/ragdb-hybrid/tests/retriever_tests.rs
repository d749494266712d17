mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{cand, config, ids, ConstDense, ConstSparse, FailingScorer, FixedStore, MapScorer};
use ragdb_core::settings::Strategy;
use ragdb_core::types::{ScoredCandidate, Stage};
use ragdb_core::{Collaborator, Error};
use ragdb_hybrid::HybridRetriever;

fn dense_abc() -> Vec<ScoredCandidate> {
    vec![cand("A", 0.9, Stage::Dense), cand("B", 0.8, Stage::Dense), cand("C", 0.7, Stage::Dense)]
}

fn sparse_ca() -> Vec<ScoredCandidate> { vec![cand("C", 5.0, Stage::Sparse), cand("A", 3.0, Stage::Sparse)] }

fn hybrid(store: FixedStore, rerank: Option<Arc<MapScorer>>) -> HybridRetriever {
    let mut builder = HybridRetriever::builder(config(Strategy::Hybrid, rerank.is_some()))
        .store(Arc::new(store))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse));
    if let Some(scorer) = rerank {
        builder = builder.scorer(scorer);
    }
    builder.build().expect("valid retriever")
}

#[tokio::test]
async fn hybrid_without_rerank_returns_fusion_order() -> anyhow::Result<()> {
    let retriever = hybrid(FixedStore::new(dense_abc(), sparse_ca()), None);

    let out = retriever.retrieve("net income").await?;
    assert_eq!(ids(&out), vec!["A", "C", "B"]);
    assert!(out.iter().all(|c| c.stage == Stage::Fused && c.rerank_score.is_none()));
    Ok(())
}

#[tokio::test]
async fn rerank_sees_the_full_fused_list_before_truncation() -> anyhow::Result<()> {
    let dense: Vec<_> = ["A", "B", "C", "D", "E"].iter().enumerate().map(|(i, id)| cand(id, 1.0 - i as f32 / 10.0, Stage::Dense)).collect();
    // E is last after fusion but best after reranking.
    let scorer = Arc::new(MapScorer::new(&[("A", 0.3), ("B", 0.1), ("C", 0.6), ("D", 0.2), ("E", 0.9)]));
    let mut cfg = config(Strategy::Hybrid, true);
    cfg.top_k_final = 2;
    let retriever = HybridRetriever::builder(cfg)
        .store(Arc::new(FixedStore::new(dense, vec![])))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse))
        .scorer(scorer.clone())
        .build()?;

    let out = retriever.retrieve("q").await?;
    assert_eq!(ids(&out), vec!["E", "C"]);
    assert_eq!(out[0].rerank_score, Some(0.9));
    assert_eq!(scorer.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn dense_strategy_passes_through_and_skips_sparse_search() -> anyhow::Result<()> {
    let store = Arc::new(FixedStore::new(vec![cand("X", 0.95, Stage::Dense)], sparse_ca()));
    let retriever = HybridRetriever::builder(config(Strategy::Dense, false))
        .store(store.clone())
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .build()?;

    let out = retriever.retrieve("q").await?;
    assert_eq!(ids(&out), vec!["X"]);
    assert_eq!(out[0].score, 0.95);
    assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn final_count_is_capped_by_candidates() -> anyhow::Result<()> {
    let mut cfg = config(Strategy::Hybrid, false);
    cfg.top_k_retrieval = 3;
    cfg.top_k_final = 10;
    let retriever = HybridRetriever::builder(cfg)
        .store(Arc::new(FixedStore::new(dense_abc(), sparse_ca())))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse))
        .build()?;

    assert_eq!(retriever.retrieve("q").await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn no_matches_is_an_empty_ok() -> anyhow::Result<()> {
    let retriever = hybrid(FixedStore::new(vec![], vec![]), Some(Arc::new(MapScorer::new(&[]))));
    assert!(retriever.retrieve("q").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn hybrid_branches_search_concurrently() -> anyhow::Result<()> {
    let store = FixedStore { delay: Some(Duration::from_millis(300)), ..FixedStore::new(dense_abc(), sparse_ca()) };
    let store = Arc::new(store);
    let retriever = HybridRetriever::builder(config(Strategy::Hybrid, false))
        .store(store.clone())
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse))
        .build()?;

    let started = Instant::now();
    let out = retriever.retrieve("q").await?;
    let elapsed = started.elapsed();

    assert_eq!(ids(&out), vec!["A", "C", "B"]);
    assert_eq!(store.searches.load(Ordering::SeqCst), 2);
    // Two sequential 300 ms searches would take at least 600 ms.
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
    Ok(())
}

#[tokio::test]
async fn slow_store_times_out() {
    let store = FixedStore { delay: Some(Duration::from_millis(500)), ..FixedStore::new(dense_abc(), sparse_ca()) };
    let mut cfg = config(Strategy::Hybrid, false);
    cfg.timeouts.search_ms = 20;
    let retriever = HybridRetriever::builder(cfg)
        .store(Arc::new(store))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse))
        .build()
        .expect("valid retriever");

    let err = retriever.retrieve("q").await.unwrap_err();
    assert!(
        matches!(err, Error::UpstreamUnavailable { collaborator: Collaborator::CandidateStore, .. }),
        "got {err:?}"
    );
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn slow_embedder_times_out() {
    let dense = ConstDense { dim: 4, delay: Some(Duration::from_millis(300)) };
    let mut cfg = config(Strategy::Dense, false);
    cfg.timeouts.embed_ms = 20;
    let retriever = HybridRetriever::builder(cfg)
        .store(Arc::new(FixedStore::new(dense_abc(), vec![])))
        .dense_embedder(Arc::new(dense))
        .build()
        .expect("valid retriever");

    let err = retriever.retrieve("q").await.unwrap_err();
    assert!(
        matches!(err, Error::UpstreamUnavailable { collaborator: Collaborator::DenseEmbedder, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn store_failure_propagates() {
    let store = FixedStore { fail: true, ..FixedStore::new(dense_abc(), sparse_ca()) };
    let retriever = hybrid(store, Some(Arc::new(MapScorer::new(&[]))));

    let err = retriever.retrieve("q").await.unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable { collaborator: Collaborator::CandidateStore, .. }));
    assert!(format!("{err}").contains("connection refused"));
}

#[tokio::test]
async fn rerank_failure_is_not_downgraded() {
    let retriever = HybridRetriever::builder(config(Strategy::Hybrid, true))
        .store(Arc::new(FixedStore::new(dense_abc(), sparse_ca())))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .sparse_embedder(Arc::new(ConstSparse))
        .scorer(Arc::new(FailingScorer))
        .build()
        .expect("valid retriever");

    let err = retriever.retrieve("q").await.unwrap_err();
    assert!(matches!(err, Error::RerankFailure(_)), "got {err:?}");
}

#[test]
fn builder_rejects_missing_collaborators() {
    let store = || Arc::new(FixedStore::default());

    let no_sparse = HybridRetriever::builder(config(Strategy::Hybrid, false))
        .store(store())
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .build();
    assert!(matches!(no_sparse, Err(Error::Configuration(_))));

    let no_scorer = HybridRetriever::builder(config(Strategy::Dense, true))
        .store(store())
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .build();
    assert!(matches!(no_scorer, Err(Error::Configuration(_))));

    let no_store = HybridRetriever::builder(config(Strategy::Dense, false)).dense_embedder(Arc::new(ConstDense::new(4))).build();
    assert!(matches!(no_store, Err(Error::Configuration(_))));
}

#[test]
fn builder_validates_config() {
    let mut cfg = config(Strategy::Dense, true);
    cfg.rerank_model_id = String::new();
    let result = HybridRetriever::builder(cfg)
        .store(Arc::new(FixedStore::default()))
        .dense_embedder(Arc::new(ConstDense::new(4)))
        .scorer(Arc::new(MapScorer::new(&[])))
        .build();
    assert!(matches!(result, Err(Error::Configuration(_))));
}
