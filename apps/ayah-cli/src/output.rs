use std::fmt::Write as _;

use ayah_core::SearchResponse;

pub fn format_json(response: &SearchResponse) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

pub fn format_human(response: &SearchResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Query: {} (detected: {})", response.query, response.detected_lang);
    if response.results.is_empty() {
        out.push_str("No results.\n");
        return out;
    }
    for (i, r) in response.results.iter().enumerate() {
        let _ = writeln!(out, "\n{}. [{}:{}] score={:.2}", i + 1, r.surah, r.ayah, r.score);
        if let Some(text) = &r.text {
            let _ = writeln!(out, "   {text}");
        }
        if let Some(translation) = &r.translation {
            let _ = writeln!(out, "   Translation: {translation}");
        }
        if let Some(tafsir) = &r.tafsir {
            let _ = writeln!(out, "   Tafsir: {tafsir}");
        }
        for link in r.context_links.iter().flatten() {
            if link.is_error() {
                let _ = writeln!(out, "   ~ {}", link.error.as_deref().unwrap_or_default());
            } else if let (Some(s), Some(a), Some(sim)) = (link.surah, link.ayah, link.similarity) {
                let _ = writeln!(out, "   ~ {s}:{a} (similarity {sim:.3}; {})", link.note);
            }
        }
    }
    out
}
