use tracing::debug;
use whatlang::Lang;

use ayah_core::traits::LanguageDetector;
use ayah_core::LangCode;

/// Statistical detection via `whatlang`, reported as ISO 639-1 codes.
///
/// Guesses under `min_confidence` are reported as undetected.
#[derive(Debug, Clone, Copy)]
pub struct WhatlangDetector {
    min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<LangCode> {
        let info = whatlang::detect(text)?;
        let code = iso639_1(info.lang());
        debug!(lang = info.lang().code(), confidence = info.confidence(), mapped = ?code, "detected query language");
        if info.confidence() < self.min_confidence {
            return None;
        }
        LangCode::new(code?).ok()
    }
}

fn iso639_1(lang: Lang) -> Option<&'static str> {
    Some(match lang {
        Lang::Ara => "ar",
        Lang::Eng => "en",
        Lang::Fra => "fr",
        Lang::Urd => "ur",
        Lang::Ind => "id",
        Lang::Tur => "tr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Rus => "ru",
        Lang::Ben => "bn",
        Lang::Pes => "fa",
        Lang::Hin => "hi",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Swe => "sv",
        Lang::Pol => "pl",
        Lang::Ukr => "uk",
        Lang::Uzb => "uz",
        Lang::Aze => "az",
        Lang::Tam => "ta",
        Lang::Mal => "ml",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        _ => return None,
    })
}

/// Always reports the same answer. Useful for pinning the language and in tests.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector(Option<LangCode>);

impl FixedDetector {
    pub fn new(lang: LangCode) -> Self {
        Self(Some(lang))
    }

    /// Never detects anything, so callers always fall back.
    pub fn undetected() -> Self {
        Self(None)
    }
}

impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Option<LangCode> {
        self.0.clone()
    }
}
