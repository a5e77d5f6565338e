use std::fs;
use tempfile::TempDir;

use ayah_core::paths::ResourcePaths;
use ayah_core::prepare::{write_json, DataProcessor};
use ayah_core::{Bundle, BundleField, Corpus, FieldLookup, LangCode, TranslationBundle};

#[test]
fn prepare_corpus_then_load_it_back() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("quran.txt"), "1|1|first\n1|2|second\n# end\n").unwrap();
    fs::write(dir.join("ar_tafsir.json"), r#"{"1:1": {"text": "t1"}}"#).unwrap();

    let processor = DataProcessor::new();
    let verses = processor
        .prepare_corpus(&dir.join("quran.txt"), Some(&dir.join("ar_tafsir.json")))
        .expect("prepare corpus");
    let out = dir.join("processed/quran.json");
    write_json(&out, &verses).unwrap();

    let corpus = Corpus::load(&out).expect("load corpus");
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.position(1, 2), Some(1));
    assert_eq!(corpus.get(0).map(|v| v.tafsir.as_str()), Some("t1"));
}

#[test]
fn prepare_translations_writes_one_bundle_per_language() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw/translations");
    let tafsir = tmp.path().join("raw/tafsir");
    fs::create_dir_all(&raw).unwrap();
    fs::create_dir_all(&tafsir).unwrap();
    fs::write(raw.join("en_sahih.json"), r#"{"1:1": {"t": "In the name"}, "1:2": {"t": "Praise"}}"#).unwrap();
    fs::write(raw.join("fr_hamidullah.json"), r#"{"1:1": {"t": "Au nom"}}"#).unwrap();
    fs::write(tafsir.join("en_mukhtasar.json"), r#"{"1:2": "All praise"}"#).unwrap();

    let paths = ResourcePaths::under(tmp.path());
    let done = DataProcessor::new()
        .prepare_translations(&raw, &tafsir, &paths.translations_dir)
        .expect("prepare translations");
    assert_eq!(done.len(), 2);

    let en = LangCode::new("en").unwrap();
    let bundle = Bundle::Translation(TranslationBundle::load(&paths.bundle_file(&en)).expect("load en"));
    assert_eq!(bundle.lookup(1, 2, BundleField::Tafsir), FieldLookup::Value("All praise".into()));
    assert_eq!(bundle.lookup(1, 1, BundleField::Translation), FieldLookup::Value("In the name".into()));
    assert_eq!(bundle.lookup(2, 1, BundleField::Translation), FieldLookup::NotFound);

    let langs: Vec<String> = paths.translation_languages().into_iter().map(String::from).collect();
    assert_eq!(langs, vec!["en", "fr"]);
}

#[test]
fn corrupt_corpus_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("quran.json");
    fs::write(&file, "{not json").unwrap();
    assert!(Corpus::load(&file).is_err());
    assert!(Corpus::load(&tmp.path().join("missing.json")).is_err());
}
