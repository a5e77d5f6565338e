//! Domain types shared by the retrieval pipeline and the offline tools.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// `(surah, ayah)` identity of a verse.
pub type VerseKey = (u32, u32);

/// A language code such as `ar`, `en` or `fr`, stored lowercase.
///
/// `auto` is not a language code; it only exists as a [`LangSetting`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LangCode(pub(crate) String);

impl LangCode {
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let code = code.as_ref().trim().to_ascii_lowercase();
        let valid = !code.is_empty()
            && code.len() <= 16
            && code != "auto"
            && code.chars().all(|c| c.is_ascii_alphabetic() || c == '-');
        if !valid {
            return Err(Error::InvalidRequest(format!("invalid language code '{code}'")));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LangCode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for LangCode {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<LangCode> for String {
    fn from(code: LangCode) -> Self {
        code.0
    }
}

impl PartialEq<str> for LangCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A per-request language choice: `"auto"` or a fixed code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LangSetting {
    #[default]
    Auto,
    Fixed(LangCode),
}

impl LangSetting {
    /// Replaces `Auto` with `detected`.
    pub fn resolve(&self, detected: &LangCode) -> LangCode {
        match self {
            LangSetting::Auto => detected.clone(),
            LangSetting::Fixed(code) => code.clone(),
        }
    }

    pub fn fixed(&self) -> Option<&LangCode> {
        match self {
            LangSetting::Auto => None,
            LangSetting::Fixed(code) => Some(code),
        }
    }
}

impl FromStr for LangSetting {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(LangSetting::Auto)
        } else {
            LangCode::new(s).map(LangSetting::Fixed)
        }
    }
}

impl TryFrom<String> for LangSetting {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LangSetting> for String {
    fn from(setting: LangSetting) -> Self {
        match setting {
            LangSetting::Auto => "auto".to_string(),
            LangSetting::Fixed(code) => code.into(),
        }
    }
}

/// One original-language verse as produced by corpus preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub surah: u32,
    pub ayah: u32,
    pub text: String,
    #[serde(default)]
    pub tafsir: String,
    #[serde(default)]
    pub embedding_text: String,
}

impl Verse {
    pub fn key(&self) -> VerseKey {
        (self.surah, self.ayah)
    }
}

/// One record of a per-language translation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub surah: u32,
    pub ayah: u32,
    pub translation: String,
    #[serde(default)]
    pub tafsir: String,
    #[serde(default)]
    pub embedding_text: String,
}

/// The ordered verse list. Position `i` is vector id `i` in the default index.
#[derive(Debug, Clone)]
pub struct Corpus {
    verses: Vec<Verse>,
    positions: HashMap<VerseKey, usize>,
}

impl Corpus {
    pub fn new(verses: Vec<Verse>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(verses.len());
        for (i, v) in verses.iter().enumerate() {
            if positions.insert(v.key(), i).is_some() {
                return Err(Error::ResourceCorrupt(format!(
                    "duplicate verse {}:{} in corpus",
                    v.surah, v.ayah
                )));
            }
        }
        Ok(Self { verses, positions })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let verses: Vec<Verse> = serde_json::from_str(&raw)?;
        Self::new(verses)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Verse> {
        self.verses.get(position)
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn position(&self, surah: u32, ayah: u32) -> Option<usize> {
        self.positions.get(&(surah, ayah)).copied()
    }
}

/// Field names a bundle can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleField {
    Text,
    Translation,
    Tafsir,
}

impl BundleField {
    pub fn name(self) -> &'static str {
        match self {
            BundleField::Text => "text",
            BundleField::Translation => "translation",
            BundleField::Tafsir => "tafsir",
        }
    }
}

/// Outcome of a bundle lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookup {
    Value(String),
    /// The record exists but its kind carries no such field.
    Absent,
    /// No record for the verse.
    NotFound,
}

impl FieldLookup {
    /// The user-visible value: a missing record becomes `"<field> not found"`.
    pub fn into_payload(self, field: BundleField) -> Option<String> {
        match self {
            FieldLookup::Value(v) => Some(v),
            FieldLookup::Absent => None,
            FieldLookup::NotFound => Some(format!("{} not found", field.name())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationBundle {
    records: Vec<TranslationRecord>,
    positions: HashMap<VerseKey, usize>,
}

impl TranslationBundle {
    /// First record wins when a key repeats.
    pub fn new(records: Vec<TranslationRecord>) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            positions.entry((r.surah, r.ayah)).or_insert(i);
        }
        Self { records, positions }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<TranslationRecord> = serde_json::from_str(&raw)?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, surah: u32, ayah: u32) -> Option<&TranslationRecord> {
        self.positions.get(&(surah, ayah)).map(|&i| &self.records[i])
    }
}

/// Translation/tafsir source for one language.
///
/// The original language reuses the corpus, which has text and tafsir but no
/// translation.
#[derive(Debug, Clone)]
pub enum Bundle {
    Corpus(Arc<Corpus>),
    Translation(TranslationBundle),
}

impl Bundle {
    pub fn lookup(&self, surah: u32, ayah: u32, field: BundleField) -> FieldLookup {
        match self {
            Bundle::Corpus(corpus) => {
                let Some(verse) = corpus.position(surah, ayah).and_then(|i| corpus.get(i)) else {
                    return FieldLookup::NotFound;
                };
                match field {
                    BundleField::Text => FieldLookup::Value(verse.text.clone()),
                    BundleField::Tafsir => FieldLookup::Value(verse.tafsir.clone()),
                    BundleField::Translation => FieldLookup::Absent,
                }
            }
            Bundle::Translation(bundle) => {
                let Some(record) = bundle.get(surah, ayah) else {
                    return FieldLookup::NotFound;
                };
                match field {
                    BundleField::Translation => FieldLookup::Value(record.translation.clone()),
                    BundleField::Tafsir => FieldLookup::Value(record.tafsir.clone()),
                    BundleField::Text => FieldLookup::Absent,
                }
            }
        }
    }
}

/// Rounds to `decimals` places for response payloads.
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f64.powi(decimals);
    ((f64::from(value) * factor).round() / factor) as f32
}
