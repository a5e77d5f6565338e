//! Offline preparation of the verse corpus and translation bundles.
//!
//! Raw inputs are a Tanzil-style `surah|ayah|text` file, tafsir JSON maps keyed
//! `"S:A"`, and translation JSON maps keyed `"S:A"` with `{"t": ...}` values.
//! Outputs are the JSON files the search pipeline loads at runtime.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{LangCode, TranslationRecord, Verse};

pub type TafsirMap = HashMap<String, String>;

/// Parses one `surah|ayah|text` line. Blank, `#` and malformed lines yield `None`.
pub fn parse_tanzil_line(line: &str) -> Option<(u32, u32, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.splitn(3, '|');
    let surah = parts.next()?.trim().parse().ok()?;
    let ayah = parts.next()?.trim().parse().ok()?;
    let text = parts.next()?.trim().to_string();
    Some((surah, ayah, text))
}

/// Entries may be plain strings or `{"text": ...}` objects.
pub fn parse_tafsir_map(raw: &str) -> Result<TafsirMap> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(Error::ResourceCorrupt("tafsir file must be a JSON object".into()));
    };
    Ok(map
        .into_iter()
        .map(|(key, entry)| {
            let text = match entry {
                Value::String(s) => s,
                Value::Object(obj) => obj.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

fn verse_key(surah: u32, ayah: u32) -> String {
    format!("{surah}:{ayah}")
}

fn parse_verse_key(key: &str) -> Option<(u32, u32)> {
    let (s, a) = key.split_once(':')?;
    Some((s.trim().parse().ok()?, a.trim().parse().ok()?))
}

pub fn build_corpus(tanzil: &str, tafsir: &TafsirMap) -> Vec<Verse> {
    tanzil
        .lines()
        .filter_map(parse_tanzil_line)
        .map(|(surah, ayah, text)| {
            let tafsir_text = tafsir.get(&verse_key(surah, ayah)).cloned().unwrap_or_default();
            let embedding_text = format!("آية: {text} تفسير: {tafsir_text}");
            Verse { surah, ayah, text, tafsir: tafsir_text, embedding_text }
        })
        .collect()
}

/// Records sorted by `(surah, ayah)`; keys that are not `S:A` are skipped.
pub fn build_translation(raw: &str, tafsir: &TafsirMap) -> Result<Vec<TranslationRecord>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(Error::ResourceCorrupt("translation file must be a JSON object".into()));
    };
    let mut records = Vec::with_capacity(map.len());
    for (key, entry) in map {
        let Some((surah, ayah)) = parse_verse_key(&key) else {
            warn!(key = %key, "skipping translation entry with malformed key");
            continue;
        };
        let translation = match entry {
            Value::Object(obj) => obj.get("t").and_then(Value::as_str).unwrap_or_default().to_string(),
            Value::String(s) => s,
            _ => String::new(),
        };
        let tafsir_text = tafsir.get(&key).cloned().unwrap_or_default();
        let embedding_text = format!("Translation: {translation} Tafsir: {tafsir_text}");
        records.push(TranslationRecord { surah, ayah, translation, tafsir: tafsir_text, embedding_text });
    }
    records.sort_by_key(|r| (r.surah, r.ayah));
    Ok(records)
}

/// Language code from a `<lang>_<anything>.json` file name.
pub fn lang_from_file_name(path: &Path) -> Option<LangCode> {
    let stem = path.file_stem()?.to_str()?;
    LangCode::new(stem.split('_').next()?).ok()
}

#[derive(Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    pub fn prepare_corpus(&self, tanzil_file: &Path, tafsir_file: Option<&Path>) -> Result<Vec<Verse>> {
        let tanzil = fs::read_to_string(tanzil_file)?;
        let tafsir = match tafsir_file {
            Some(p) => parse_tafsir_map(&fs::read_to_string(p)?)?,
            None => {
                warn!(file = %tanzil_file.display(), "no tafsir file; corpus tafsir will be empty");
                TafsirMap::new()
            }
        };
        let verses = build_corpus(&tanzil, &tafsir);
        info!(verses = verses.len(), "prepared corpus");
        Ok(verses)
    }

    /// Converts every `<lang>_*.json` under `raw_dir` into `<lang>_quran.json`
    /// under `out_dir`, pairing each with the first `<lang>_*.json` tafsir.
    pub fn prepare_translations(&self, raw_dir: &Path, tafsir_dir: &Path, out_dir: &Path) -> Result<Vec<(LangCode, usize)>> {
        fs::create_dir_all(out_dir)?;
        let mut done = Vec::new();
        for file in self.list_json_files(raw_dir) {
            let Some(lang) = lang_from_file_name(&file) else {
                warn!(file = %file.display(), "cannot derive language code; skipping");
                continue;
            };
            let tafsir = match self.find_tafsir_file(tafsir_dir, &lang) {
                Some(p) => parse_tafsir_map(&fs::read_to_string(&p)?)?,
                None => TafsirMap::new(),
            };
            let records = build_translation(&fs::read_to_string(&file)?, &tafsir)?;
            let out = out_dir.join(format!("{lang}_quran.json"));
            write_json(&out, &records)?;
            info!(lang = %lang, records = records.len(), out = %out.display(), "prepared translation bundle");
            done.push((lang, records.len()));
        }
        Ok(done)
    }

    pub fn find_tafsir_file(&self, tafsir_dir: &Path, lang: &LangCode) -> Option<PathBuf> {
        let prefix = format!("{lang}_");
        self.list_json_files(tafsir_dir)
            .into_iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with(&prefix)))
    }

    fn list_json_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        files.sort();
        files
    }
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tanzil_lines() {
        assert_eq!(parse_tanzil_line("1|1|بسم الله"), Some((1, 1, "بسم الله".to_string())));
        assert_eq!(parse_tanzil_line("  2|255| text with | pipe "), Some((2, 255, "text with | pipe".to_string())));
        assert_eq!(parse_tanzil_line("# comment"), None);
        assert_eq!(parse_tanzil_line(""), None);
        assert_eq!(parse_tanzil_line("1|x|text"), None);
        assert_eq!(parse_tanzil_line("1|2"), None);
    }

    #[test]
    fn tafsir_accepts_strings_and_objects() {
        let map = parse_tafsir_map(r#"{"1:1": "plain", "1:2": {"text": "nested"}, "1:3": {"other": 1}}"#).unwrap();
        assert_eq!(map["1:1"], "plain");
        assert_eq!(map["1:2"], "nested");
        assert_eq!(map["1:3"], "");
        assert!(parse_tafsir_map("[]").is_err());
    }

    #[test]
    fn corpus_joins_tafsir_by_key() {
        let tafsir = parse_tafsir_map(r#"{"1:2": "praise"}"#).unwrap();
        let verses = build_corpus("# header\n1|1|a\n1|2|b\nbad line\n", &tafsir);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].tafsir, "");
        assert_eq!(verses[1].tafsir, "praise");
        assert_eq!(verses[1].embedding_text, "آية: b تفسير: praise");
    }

    #[test]
    fn translation_records_are_sorted_numerically() {
        let raw = r#"{"1:10": {"t": "ten"}, "1:2": {"t": "two"}, "2:1": "plain", "oops": {"t": "x"}}"#;
        let tafsir = parse_tafsir_map(r#"{"1:2": "note"}"#).unwrap();
        let records = build_translation(raw, &tafsir).unwrap();
        let keys: Vec<(u32, u32)> = records.iter().map(|r| (r.surah, r.ayah)).collect();
        assert_eq!(keys, vec![(1, 2), (1, 10), (2, 1)]);
        assert_eq!(records[0].embedding_text, "Translation: two Tafsir: note");
        assert_eq!(records[2].translation, "plain");
    }

    #[test]
    fn lang_from_prefix() {
        assert_eq!(lang_from_file_name(Path::new("en_sahih.json")).map(String::from), Some("en".to_string()));
        assert_eq!(lang_from_file_name(Path::new("fr.json")).map(String::from), Some("fr".to_string()));
    }
}
