//! `ayah-indexer` - offline preparation of the corpus, translation bundles
//! and verse embedding indices.

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use ayah_cli::{init_tracing, load_app_config, report};
use ayah_core::config::{expand_path, resolve_with_base, AppConfig};
use ayah_core::paths::ResourcePaths;
use ayah_core::prepare::{write_json, DataProcessor};
use ayah_core::{Corpus, LangCode, TranslationBundle};
use ayah_embed::get_default_embedder;
use ayah_vector::build_index;

#[derive(Parser)]
#[command(name = "ayah-indexer", version, about = "Prepare data and build verse indices")]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tanzil text + tafsir -> processed corpus JSON
    PrepareCorpus {
        #[arg(long)]
        tanzil: Option<PathBuf>,
        #[arg(long)]
        tafsir: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Raw `<lang>_*.json` translations -> `<lang>_quran.json` bundles
    PrepareTranslations {
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        #[arg(long)]
        tafsir_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Embed passages and write the default and per-language indices
    BuildIndex(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Only these translation languages (default: every prepared bundle)
    #[arg(long = "lang")]
    langs: Vec<LangCode>,

    /// Leave the default index untouched
    #[arg(long)]
    skip_default: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = load_app_config(cli.config_dir.as_deref())?;
    let base = expand_path(&app.data.base_dir);
    let paths = ResourcePaths::from_config(&app.data);
    let processor = DataProcessor::new();

    match cli.command {
        Command::PrepareCorpus { tanzil, tafsir, out } => {
            let tanzil = tanzil.unwrap_or_else(|| resolve_with_base(&base, &app.data.raw_quran_file));
            let tafsir = tafsir.or_else(|| {
                processor.find_tafsir_file(&resolve_with_base(&base, &app.data.raw_tafsir_dir), &app.policy.original_lang)
            });
            let out = out.unwrap_or_else(|| paths.corpus_file.clone());
            let verses = processor
                .prepare_corpus(&tanzil, tafsir.as_deref())
                .with_context(|| format!("preparing corpus from {}", tanzil.display()))?;
            write_json(&out, &verses)?;
            info!(verses = verses.len(), out = %out.display(), "corpus written");
        }
        Command::PrepareTranslations { raw_dir, tafsir_dir, out_dir } => {
            let raw_dir = raw_dir.unwrap_or_else(|| resolve_with_base(&base, &app.data.raw_translations_dir));
            let tafsir_dir = tafsir_dir.unwrap_or_else(|| resolve_with_base(&base, &app.data.raw_tafsir_dir));
            let out_dir = out_dir.unwrap_or_else(|| paths.translations_dir.clone());
            let done = processor.prepare_translations(&raw_dir, &tafsir_dir, &out_dir)?;
            if done.is_empty() {
                warn!(dir = %raw_dir.display(), "no translation files found");
            }
        }
        Command::BuildIndex(args) => build(&app, &paths, &args).await?,
    }
    Ok(())
}

async fn build(app: &AppConfig, paths: &ResourcePaths, args: &BuildArgs) -> anyhow::Result<()> {
    let corpus = Corpus::load(&paths.corpus_file)
        .with_context(|| format!("loading corpus {}", paths.corpus_file.display()))?;
    let embedder = get_default_embedder(&app.model)?;
    let prefix = &app.model.passage_prefix;
    let batch = app.model.batch_size;

    if !args.skip_default {
        let texts: Vec<String> = corpus.verses().iter().map(|v| passage_text(&v.embedding_text, &v.text)).collect();
        build_index(embedder.as_ref(), &texts, prefix, batch, &paths.default_index).await?;
    }

    let langs = if args.langs.is_empty() { paths.translation_languages() } else { args.langs.clone() };
    for lang in langs.iter().filter(|l| **l != app.policy.original_lang) {
        let bundle = TranslationBundle::load(&paths.bundle_file(lang))
            .with_context(|| format!("loading {lang} translation bundle"))?;
        // Rows follow corpus order so that ids stay corpus positions; verses
        // the translation lacks keep their original-language passage.
        let mut missing = 0usize;
        let texts: Vec<String> = corpus
            .verses()
            .iter()
            .map(|v| match bundle.get(v.surah, v.ayah) {
                Some(r) => passage_text(&r.embedding_text, &r.translation),
                None => {
                    missing += 1;
                    passage_text(&v.embedding_text, &v.text)
                }
            })
            .collect();
        if missing > 0 {
            warn!(lang = %lang, missing, "translation lacks some verses");
        }
        build_index(embedder.as_ref(), &texts, prefix, batch, &paths.index_path(lang)).await?;
    }
    Ok(())
}

fn passage_text(embedding_text: &str, fallback: &str) -> String {
    if embedding_text.is_empty() { fallback.to_string() } else { embedding_text.to_string() }
}
