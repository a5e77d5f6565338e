mod common;

use std::sync::Arc;

use ayah_core::config::PolicyConfig;
use ayah_core::SearchRequest;
use ayah_retrieval::{FixedDetector, ResourceCache, SearchService, LanceIndexLoader};
use common::{corpus, default_vectors, lang, StaticEmbedder};

#[tokio::test]
async fn search_through_a_lance_index_maps_ids_to_corpus_positions() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let paths = ayah_core::paths::ResourcePaths::under(tmp.path());
    ayah_vector::write_index(&paths.default_index, 3, &default_vectors()).await?;

    let cache = Arc::new(ResourceCache::new(
        paths,
        lang("ar"),
        "query: ",
        Arc::new(corpus()),
        Arc::new(StaticEmbedder::new()),
        Arc::new(LanceIndexLoader),
    ));
    let service = SearchService::new(cache, Arc::new(FixedDetector::new(lang("en"))), PolicyConfig::default());

    let mut req = SearchRequest::new("mercy");
    req.top_k = 1;
    let response = service.search(&req).await?;
    let hit = &response.results[0];
    assert_eq!((hit.surah, hit.ayah), (1, 1));
    assert_eq!(hit.score, 1.0);
    assert_eq!(hit.text.as_deref(), Some("text 1:1"));
    // No en bundle was written.
    assert_eq!(hit.translation.as_deref(), Some("translation not found"));
    Ok(())
}
