//! Request and response shapes of the search operation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{LangCode, LangSetting};

pub const DEFAULT_NOTE: &str = "For reference only; may contain mistakes";

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_TOP_K: usize = 50;
pub const MAX_CONTEXT_WINDOW: u32 = 50;
pub const MAX_CONTEXT_LINKS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub include_text: bool,
    pub include_translation: bool,
    pub translation_lang: LangSetting,
    pub include_tafsir: bool,
    pub tafsir_lang: LangSetting,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            include_text: true,
            include_translation: true,
            translation_lang: LangSetting::Auto,
            include_tafsir: true,
            tafsir_lang: LangSetting::Auto,
        }
    }
}

/// Accepted for compatibility; the pipeline does not expand queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionSettings {
    pub force_query_expansion: bool,
    pub force_llm_query_expansion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    pub enable_context_links: bool,
    pub context_window: u32,
    pub similarity_threshold: f32,
    pub max_context_links: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            enable_context_links: true,
            context_window: 10,
            similarity_threshold: 0.7,
            max_context_links: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub settings: SearchSettings,
    #[serde(default)]
    pub expansion: ExpansionSettings,
    #[serde(default)]
    pub context: ContextSettings,
}

fn default_top_k() -> usize {
    5
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: default_top_k(),
            settings: SearchSettings::default(),
            expansion: ExpansionSettings::default(),
            context: ContextSettings::default(),
        }
    }

    /// Checks the numeric bounds the search endpoint accepts.
    pub fn validate(&self) -> Result<()> {
        if self.query.chars().count() < MIN_QUERY_CHARS {
            return Err(Error::InvalidRequest(format!(
                "query must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        check_range("top_k", self.top_k, 1, MAX_TOP_K)?;
        check_range("context_window", self.context.context_window, 1, MAX_CONTEXT_WINDOW)?;
        check_range("max_context_links", self.context.max_context_links, 1, MAX_CONTEXT_LINKS)?;
        if !(0.0..=1.0).contains(&self.context.similarity_threshold) {
            return Err(Error::InvalidRequest(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.context.similarity_threshold
            )));
        }
        Ok(())
    }

    /// Languages fixed by the caller (not `auto`).
    pub fn fixed_languages(&self) -> Vec<&LangCode> {
        [&self.settings.translation_lang, &self.settings.tafsir_lang]
            .into_iter()
            .filter_map(LangSetting::fixed)
            .collect()
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(Error::InvalidRequest(format!(
            "{name} must be within [{min}, {max}], got {value}"
        )));
    }
    Ok(())
}

/// A nearby verse linked to a result, or a placeholder carrying `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLink {
    pub surah: Option<u32>,
    pub ayah: Option<u32>,
    pub similarity: Option<f32>,
    pub note: String,
    pub error: Option<String>,
}

impl ContextLink {
    pub fn link(surah: u32, ayah: u32, similarity: f32) -> Self {
        Self {
            surah: Some(surah),
            ayah: Some(ayah),
            similarity: Some(similarity),
            note: DEFAULT_NOTE.to_string(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            surah: None,
            ayah: None,
            similarity: None,
            note: DEFAULT_NOTE.to_string(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub surah: u32,
    pub ayah: u32,
    pub score: f32,
    pub text: Option<String>,
    pub translation: Option<String>,
    pub tafsir: Option<String>,
    pub context_links: Option<Vec<ContextLink>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub detected_lang: LangCode,
    pub results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_endpoint_schema() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "mercy"}"#).unwrap();
        assert_eq!(req.top_k, 5);
        assert!(req.settings.include_text && req.settings.include_translation && req.settings.include_tafsir);
        assert_eq!(req.settings.translation_lang, LangSetting::Auto);
        assert!(req.context.enable_context_links);
        assert_eq!(req.context.context_window, 10);
        assert_eq!(req.context.max_context_links, 5);
        assert!(!req.expansion.force_query_expansion);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut req = SearchRequest::new("m");
        assert!(matches!(req.validate(), Err(Error::InvalidRequest(_))));

        req.query = "mercy".into();
        req.top_k = 0;
        assert!(req.validate().is_err());
        req.top_k = 51;
        assert!(req.validate().is_err());
        req.top_k = 50;
        assert!(req.validate().is_ok());

        req.context.similarity_threshold = 1.5;
        assert!(req.validate().is_err());
        req.context.similarity_threshold = f32::NAN;
        assert!(req.validate().is_err());
        req.context.similarity_threshold = 0.0;

        req.context.context_window = 0;
        assert!(req.validate().is_err());
        req.context.context_window = 50;
        req.context.max_context_links = 21;
        assert!(req.validate().is_err());
    }

    #[test]
    fn error_link_has_no_location() {
        let link = ContextLink::error("Verse 1:99 not found.");
        assert!(link.is_error());
        assert!(link.surah.is_none() && link.ayah.is_none() && link.similarity.is_none());
        assert_eq!(link.note, DEFAULT_NOTE);
    }

    #[test]
    fn fixed_languages_skip_auto() {
        let mut req = SearchRequest::new("mercy");
        assert!(req.fixed_languages().is_empty());
        req.settings.tafsir_lang = "ar".parse().unwrap();
        let langs: Vec<&str> = req.fixed_languages().into_iter().map(LangCode::as_str).collect();
        assert_eq!(langs, vec!["ar"]);
    }
}
