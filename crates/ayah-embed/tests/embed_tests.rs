use ayah_core::config::ModelConfig;
use ayah_embed::{get_default_embedder, with_prefix, FakeEmbedder};
use ayah_core::traits::Embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    let mut cfg = ModelConfig::default();
    cfg.use_fake = true;
    cfg.fake_dim = 768;

    let embedder = get_default_embedder(&cfg).expect("embedder");
    let texts = vec![with_prefix(&cfg.query_prefix, "mercy"), with_prefix(&cfg.query_prefix, "mercy")];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 768);
    assert_eq!(embedder.dim(), 768);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_separates_different_texts() {
    let embedder = FakeEmbedder::new(64);
    let embs = embedder
        .embed_batch(&["query: mercy".to_string(), "query: patience and prayer".to_string()])
        .unwrap();
    let dot: f32 = embs[0].iter().zip(&embs[1]).map(|(a, b)| a * b).sum();
    assert!(dot < 0.999, "distinct texts should not collapse (dot={dot})");
}

#[test]
fn prefixes_are_prepended_verbatim() {
    assert_eq!(with_prefix("query: ", "mercy"), "query: mercy");
    assert_eq!(with_prefix("passage: ", "آية"), "passage: آية");
}
