//! Directory convention for corpus, bundles and per-language indices.

use std::path::{Path, PathBuf};

use crate::config::{expand_path, resolve_with_base, DataConfig};
use crate::types::LangCode;

const BUNDLE_SUFFIX: &str = "_quran.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub corpus_file: PathBuf,
    pub translations_dir: PathBuf,
    pub default_index: PathBuf,
    pub translation_index_dir: PathBuf,
}

impl ResourcePaths {
    pub fn from_config(data: &DataConfig) -> Self {
        let base = expand_path(&data.base_dir);
        Self {
            corpus_file: resolve_with_base(&base, &data.corpus_file),
            translations_dir: resolve_with_base(&base, &data.translations_dir),
            default_index: resolve_with_base(&base, &data.default_index),
            translation_index_dir: resolve_with_base(&base, &data.translation_index_dir),
        }
    }

    /// Default layout rooted at `base`.
    pub fn under(base: &Path) -> Self {
        let mut data = DataConfig::default();
        data.base_dir = base.to_string_lossy().to_string();
        Self::from_config(&data)
    }

    pub fn bundle_file(&self, lang: &LangCode) -> PathBuf {
        self.translations_dir.join(format!("{lang}{BUNDLE_SUFFIX}"))
    }

    pub fn index_path(&self, lang: &LangCode) -> PathBuf {
        self.translation_index_dir.join(lang.as_str()).join("index.lance")
    }

    /// Languages that have a prepared translation file, sorted.
    pub fn translation_languages(&self) -> Vec<LangCode> {
        let mut langs: Vec<LangCode> = walkdir::WalkDir::new(&self.translations_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                let lang = name.strip_suffix(".json")?.split('_').next()?.to_string();
                LangCode::new(lang).ok()
            })
            .collect();
        langs.sort();
        langs.dedup();
        langs
    }

    /// Every accepted language setting: `auto`, the original language, and
    /// each prepared translation language.
    pub fn supported_settings(&self, original: &LangCode) -> Vec<String> {
        let mut out = vec!["auto".to_string(), original.to_string()];
        for lang in self.translation_languages() {
            if !out.iter().any(|s| s == lang.as_str()) {
                out.push(lang.to_string());
            }
        }
        out
    }

    pub fn is_supported(&self, original: &LangCode, lang: &LangCode) -> bool {
        lang == original || self.translation_languages().contains(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn layout_follows_convention() {
        let paths = ResourcePaths::under(Path::new("/srv/ayah"));
        let en = LangCode::new("en").unwrap();
        assert_eq!(paths.corpus_file, PathBuf::from("/srv/ayah/data/processed/quran.json"));
        assert_eq!(
            paths.bundle_file(&en),
            PathBuf::from("/srv/ayah/data/processed/translations/en_quran.json")
        );
        assert_eq!(
            paths.index_path(&en),
            PathBuf::from("/srv/ayah/data/embeddings/translations/en/index.lance")
        );
        assert_eq!(paths.default_index, PathBuf::from("/srv/ayah/data/embeddings/quran.lance"));
    }

    #[test]
    fn languages_come_from_translation_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ResourcePaths::under(tmp.path());
        fs::create_dir_all(&paths.translations_dir).unwrap();
        fs::write(paths.translations_dir.join("fr_quran.json"), "[]").unwrap();
        fs::write(paths.translations_dir.join("en_quran.json"), "[]").unwrap();
        fs::write(paths.translations_dir.join("notes.txt"), "").unwrap();

        let langs: Vec<String> = paths.translation_languages().into_iter().map(String::from).collect();
        assert_eq!(langs, vec!["en", "fr"]);

        let ar = LangCode::new("ar").unwrap();
        assert_eq!(paths.supported_settings(&ar), vec!["auto", "ar", "en", "fr"]);
        assert!(paths.is_supported(&ar, &LangCode::new("fr").unwrap()));
        assert!(!paths.is_supported(&ar, &LangCode::new("de").unwrap()));
    }
}
