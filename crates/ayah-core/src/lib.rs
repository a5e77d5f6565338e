#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod paths;
pub mod prepare;
pub mod request;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use request::{ContextLink, ContextSettings, ExpansionSettings, SearchRequest, SearchResponse, SearchResult, SearchSettings};
pub use types::{Bundle, BundleField, Corpus, FieldLookup, LangCode, LangSetting, TranslationBundle, TranslationRecord, Verse};
