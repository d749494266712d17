use ragdb_core::settings::EmbeddingConfig;
use ragdb_core::traits::{DenseEmbedder, RelevanceScorer, SparseEmbedder};
use ragdb_embed::hashed::terms;
use ragdb_embed::{dense_embedder, relevance_scorer, sparse_embedder, HashedDenseEmbedder, HashedSparseEmbedder, LexicalOverlapScorer};

fn fake_config() -> EmbeddingConfig {
    EmbeddingConfig { use_fake: true, dense_dim: 64, sparse_dim: 4096, ..Default::default() }
}

#[test]
fn hashed_dense_shapes_and_determinism() {
    let embedder = HashedDenseEmbedder::new(1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_dense(&texts).expect("embed");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn terms_drop_stop_words_and_punctuation() {
    assert_eq!(terms("What was the Net Income in 2023?"), vec!["net", "income", "2023"]);
}

#[test]
fn hashed_sparse_is_sorted_normalized_and_overlapping() {
    let embedder = HashedSparseEmbedder::new(1 << 16);
    let out = embedder
        .embed_sparse(&["net income net income 2023".to_string(), "net income".to_string(), "asian markets".to_string()])
        .expect("embed");
    for sv in &out {
        assert!(sv.indices.windows(2).all(|w| w[0] < w[1]), "indices strictly ascending");
        assert_eq!(sv.indices.len(), sv.values.len());
        let norm: f32 = sv.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
    assert!(out[0].dot(&out[1]).unwrap_or(0.0) > 0.5);
    assert_eq!(out[1].dot(&out[2]), None);
}

#[test]
fn lexical_scorer_keeps_pair_order() {
    let scorer = LexicalOverlapScorer::new();
    let pairs = vec![
        ("net income 2023".to_string(), "Competitor X reported a loss".to_string()),
        ("net income 2023".to_string(), "Net Income for 2023 was $50 million.".to_string()),
    ];
    let scores = scorer.score(&pairs).expect("score");
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0], 0.0);
    assert!((scores[1] - 1.0).abs() < 1e-6);
}

#[test]
fn factories_honour_use_fake() {
    let cfg = fake_config();
    let dense = dense_embedder(&cfg).expect("dense");
    assert_eq!(dense.dim(), 64);
    let sparse = sparse_embedder(&cfg).expect("sparse");
    assert_eq!(sparse.embed_sparse(&["alpha".to_string()]).expect("sparse").len(), 1);
    let scorer = relevance_scorer(&cfg, "BAAI/bge-reranker-v2-m3").expect("scorer");
    assert_eq!(scorer.model_id(), "lexical-overlap");
}

#[test]
fn scorer_requires_model_id() {
    assert!(relevance_scorer(&fake_config(), "  ").is_err());
}

#[test]
fn missing_model_dir_is_a_configuration_error() {
    let cfg = EmbeddingConfig { model_dir: Some("/nonexistent/ragdb/model".to_string()), ..Default::default() };
    if std::env::var("APP_MODEL_DIR").is_ok() || std::env::var("MODEL_DIR").is_ok() || std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() {
        return;
    }
    assert!(matches!(dense_embedder(&cfg), Err(ragdb_core::Error::Configuration(_))));
}

#[test]
fn hashed_sparse_model_skips_splade() {
    let cfg = EmbeddingConfig { sparse_model: "Hashed".to_string(), sparse_dim: 1024, ..Default::default() };
    assert!(cfg.hashed_sparse());
    let sparse = sparse_embedder(&cfg).expect("hashed sparse needs no model files");
    let out = sparse.embed_sparse(&["net income".to_string()]).expect("sparse");
    assert!(out[0].indices.iter().all(|i| *i < 1024));
}

#[test]
fn missing_splade_dir_is_a_configuration_error() {
    let cfg = EmbeddingConfig { sparse_model_dir: Some("/nonexistent/ragdb/splade".to_string()), ..Default::default() };
    assert!(!cfg.hashed_sparse());
    if std::env::var("APP_SPARSE_MODEL_DIR").is_ok() || std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() {
        return;
    }
    match sparse_embedder(&cfg) {
        Err(ragdb_core::Error::Configuration(msg)) => assert!(msg.contains("Splade_PP_En_v1"), "{msg}"),
        Err(other) => panic!("expected configuration error, got {other:?}"),
        Ok(_) => panic!("expected configuration error"),
    }
}

#[test]
fn missing_reranker_dir_is_a_configuration_error() {
    let cfg = EmbeddingConfig { reranker_dir: Some("/nonexistent/ragdb/reranker".to_string()), reranker_max_len: 1024, ..Default::default() };
    if std::env::var("APP_RERANKER_DIR").is_ok() || std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() {
        return;
    }
    assert!(matches!(relevance_scorer(&cfg, "BAAI/bge-reranker-v2-m3"), Err(ragdb_core::Error::Configuration(_))));
}
