//! `ayah` - semantic verse search.
//!
//! ```bash
//! ayah search "mercy" --top-k 3
//! ayah search "patience" --translation-lang fr --no-context --json
//! ayah languages
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use ayah_cli::output::{format_human, format_json};
use ayah_cli::{init_tracing, load_app_config, report};
use ayah_core::paths::ResourcePaths;
use ayah_core::{LangSetting, SearchRequest};
use ayah_retrieval::SearchService;

#[derive(Parser)]
#[command(name = "ayah", version, about = "Semantic search over Quran verses")]
struct Cli {
    /// Directory holding config.toml (default: current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search verses by meaning
    Search(SearchArgs),
    /// List accepted language settings
    Languages,
}

#[derive(Args)]
struct SearchArgs {
    query: String,

    #[arg(short = 'k', long, default_value_t = 5)]
    top_k: usize,

    /// Language of translations: `auto` or a code such as `en`
    #[arg(long, default_value = "auto")]
    translation_lang: LangSetting,

    /// Language of tafsir: `auto` or a code such as `ar`
    #[arg(long, default_value = "auto")]
    tafsir_lang: LangSetting,

    #[arg(long)]
    no_text: bool,

    #[arg(long)]
    no_translation: bool,

    #[arg(long)]
    no_tafsir: bool,

    /// Skip context links
    #[arg(long)]
    no_context: bool,

    /// Ayahs on each side considered for context links
    #[arg(long, default_value_t = 10)]
    window: u32,

    /// Minimum similarity of a context link
    #[arg(long, default_value_t = 0.7)]
    threshold: f32,

    #[arg(long, default_value_t = 5)]
    max_links: usize,

    #[arg(long)]
    json: bool,
}

impl SearchArgs {
    fn to_request(&self) -> SearchRequest {
        let mut req = SearchRequest::new(self.query.clone());
        req.top_k = self.top_k;
        req.settings.include_text = !self.no_text;
        req.settings.include_translation = !self.no_translation;
        req.settings.translation_lang = self.translation_lang.clone();
        req.settings.include_tafsir = !self.no_tafsir;
        req.settings.tafsir_lang = self.tafsir_lang.clone();
        req.context.enable_context_links = !self.no_context;
        req.context.context_window = self.window;
        req.context.similarity_threshold = self.threshold;
        req.context.max_context_links = self.max_links;
        req
    }
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
    match cli.command {
        Command::Languages => {
            let paths = ResourcePaths::from_config(&app.data);
            for setting in paths.supported_settings(&app.policy.original_lang) {
                println!("{setting}");
            }
        }
        Command::Search(args) => {
            let request = args.to_request();
            // Cheap bounds checks before any model is loaded.
            request.validate()?;
            let service = SearchService::from_config(&app)?;
            service.validate(&request)?;
            let response = service.search(&request).await?;
            let output = if args.json { format_json(&response)? } else { format_human(&response) };
            println!("{output}");
        }
    }
    Ok(())
}
