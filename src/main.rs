//! CLI entry point for label search.
//!
//! Provides commands for initializing a workspace, building the embedding
//! cache, and running semantic queries against the label corpus.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use labelseek::display::{self, EmbeddingProgress, THEME};
use labelseek::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use labelseek::semantic::{CacheSource, SearchHit, SearchOptions};
use labelseek::session::{self, SessionOptions};
use labelseek::{DomainSubset, EmbeddingGenerator, SearchError, SearchResult, Settings};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

// JSON output structures
#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    model: &'a str,
    cutoff: f32,
    hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct IndexInfo {
    model: String,
    rows: usize,
    dimension: usize,
    excluded_domains: Vec<String>,
    cache_path: PathBuf,
    rebuilt: bool,
    created: String,
}

#[derive(Debug, Serialize)]
struct DomainCount {
    domain: String,
    labels: usize,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Semantic search over a catalog of labels
#[derive(Parser)]
#[command(
    name = "labelseek",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic search over a catalog of labels",
    long_about = "Embed a CSV of labels once, then rank free-text queries against it by cosine similarity.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Corpus CSV (overrides data.csv_path)
    #[arg(long, global = true, value_name = "CSV")]
    data: Option<PathBuf>,

    /// Embedding model (overrides semantic_search.model)
    #[arg(long, global = true, value_name = "NAME")]
    model: Option<String>,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .labelseek directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .labelseek/settings.toml")]
    Config,

    /// Build or load the embedding cache
    #[command(
        about = "Embed the corpus and write the cache",
        after_help = "Examples:\n  labelseek index\n  labelseek index --force\n  labelseek index --exclude-domain imaging"
    )]
    Index {
        /// Recompute embeddings even if a cache exists
        #[arg(short, long)]
        force: bool,

        /// Leave a domain out of the embedded corpus (repeatable)
        #[arg(long = "exclude-domain", value_name = "DOMAIN", value_delimiter = ',')]
        exclude_domains: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Rank labels against a free-text query
    #[command(
        about = "Find labels semantically similar to a query",
        after_help = "Examples:\n  labelseek search \"how well do you sleep\"\n  labelseek search \"income\" --cutoff 0.4 --limit 10\n  labelseek search \"memory\" --domain cognition --json\n\nJSON paths:\n  .data.hits[].label\n  .data.hits[].score"
    )]
    Search {
        /// Query text
        query: String,

        /// Minimum score, exclusive (overrides semantic_search.threshold)
        #[arg(long)]
        cutoff: Option<f32>,

        /// Only return labels from this domain (repeatable)
        #[arg(long = "domain", value_name = "DOMAIN", value_delimiter = ',')]
        domains: Vec<String>,

        /// Leave a domain out of the embedded corpus (repeatable)
        #[arg(long = "exclude-domain", value_name = "DOMAIN", value_delimiter = ',')]
        exclude_domains: Vec<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the domains present in the corpus
    #[command(about = "List corpus domains with label counts")]
    Domains {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn format(&self) -> OutputFormat {
        match self {
            Commands::Index { json, .. }
            | Commands::Search { json, .. }
            | Commands::Domains { json } => OutputFormat::from_json_flag(*json),
            Commands::Init { .. } | Commands::Config => OutputFormat::Text,
        }
    }
}

/// Entry point: load settings, apply CLI overrides, dispatch.
fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            return ExitCode::ConfigError.into();
        }
    };

    labelseek::logging::init(cli.verbose, settings.debug);

    if let Some(data) = &cli.data {
        settings.data.csv_path = std::path::absolute(data).unwrap_or_else(|_| data.clone());
    }
    if let Some(model) = &cli.model {
        settings.semantic_search.model = model.clone();
    }

    if !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            tracing::info!("{warning}, using default configuration");
        }
    }

    let format = cli.command.format();
    let result = match cli.command {
        Commands::Init { force } => return finish(run_init(force)),
        Commands::Config => return finish(run_config(&settings)),
        Commands::Index {
            force,
            exclude_domains,
            ..
        } => run_index(&settings, force, &exclude_domains, format),
        Commands::Search {
            query,
            cutoff,
            domains,
            exclude_domains,
            limit,
            ..
        } => {
            let options = SearchOptions::default()
                .with_cutoff(cutoff.unwrap_or(settings.semantic_search.threshold))
                .with_domains(domains)
                .with_limit(limit.or(settings.semantic_search.limit));
            run_search(&settings, &query, &options, &exclude_domains, format)
        }
        Commands::Domains { .. } => run_domains(&settings, format),
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => report_error(&e, format).into(),
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    use anyhow::Context;

    match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display())),
        None => Ok(Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })),
    }
}

fn finish(result: anyhow::Result<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::GeneralError.into()
        }
    }
}

fn report_error(error: &SearchError, format: OutputFormat) -> ExitCode {
    if format.is_json() {
        let response = JsonResponse::from_error(error);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("{error}"),
        }
    } else {
        eprintln!("{}", THEME.error_with_icon(&error.to_string()));
        for suggestion in error.recovery_suggestions() {
            eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
        }
    }
    ExitCode::from_error(error)
}

fn print_json<T: Serialize>(response: &JsonResponse<T>) -> SearchResult<()> {
    let json = serde_json::to_string_pretty(response).map_err(|e| SearchError::Storage {
        message: format!("Failed to serialize output: {e}"),
        suggestion: "This is likely a bug in the code".to_string(),
    })?;
    println!("{json}");
    Ok(())
}

fn run_init(force: bool) -> anyhow::Result<()> {
    let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!(
        "{}",
        THEME.success_with_icon(&format!("Created configuration file at: {}", path.display()))
    );
    println!("Edit this file to point data.csv_path at your corpus.");
    Ok(())
}

fn run_config(settings: &Settings) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

/// Load the corpus, the model and the cache for `exclude_domains`.
fn open(
    settings: &Settings,
    exclude_domains: &[String],
    force_rebuild: bool,
    format: OutputFormat,
) -> SearchResult<session::SearchSession> {
    let interactive = !format.is_json();
    let corpus = session::load_corpus(settings)?;

    let generator: Arc<dyn EmbeddingGenerator> = Arc::new(display::with_spinner(
        &format!("Loading model {}", settings.semantic_search.model),
        interactive,
        || session::load_generator(settings, interactive),
    )?);

    let mut options = SessionOptions::from_settings(settings);
    if !exclude_domains.is_empty() {
        options.subset = DomainSubset::excluding(exclude_domains);
    }
    options.force_rebuild = force_rebuild;

    let cache = session::cache_for(settings);
    let mut progress = EmbeddingProgress::new(interactive);
    let session = session::open_session(&cache, &corpus, generator, &options, &mut |done, total| {
        progress.update(done, total)
    });
    progress.finish();
    session
}

fn run_index(
    settings: &Settings,
    force: bool,
    exclude_domains: &[String],
    format: OutputFormat,
) -> SearchResult<ExitCode> {
    let start = Instant::now();
    let session = open(settings, exclude_domains, force, format)?;
    let metadata = &session.metadata;

    let info = IndexInfo {
        model: metadata.model_name.clone(),
        rows: metadata.embedding_count,
        dimension: metadata.dimension,
        excluded_domains: metadata.excluded_domains.clone(),
        cache_path: session.cache_path.clone(),
        rebuilt: session.source == CacheSource::Built,
        created: metadata.created_display(),
    };

    if format.is_json() {
        print_json(
            &JsonResponse::success(info).with_meta(
                ResponseMeta::now()
                    .with_model(session.search.model_name())
                    .with_elapsed(start.elapsed()),
            ),
        )?;
        return Ok(ExitCode::Success);
    }

    let status = if info.rebuilt {
        format!("Embedded {} labels", info.rows)
    } else {
        format!("Embedding cache is up to date ({} labels)", info.rows)
    };
    println!("{}", THEME.success_with_icon(&status));

    let excluded = if info.excluded_domains.is_empty() {
        "none".to_string()
    } else {
        info.excluded_domains.join(", ")
    };
    println!(
        "{}",
        display::create_summary_table(&[
            ("Model", info.model.clone()),
            ("Rows", info.rows.to_string()),
            ("Dimension", info.dimension.to_string()),
            ("Excluded domains", excluded),
            ("Cache", info.cache_path.display().to_string()),
            ("Created", info.created.clone()),
        ])
    );
    Ok(ExitCode::Success)
}

fn run_search(
    settings: &Settings,
    query: &str,
    options: &SearchOptions,
    exclude_domains: &[String],
    format: OutputFormat,
) -> SearchResult<ExitCode> {
    let start = Instant::now();

    // Blank queries still validate the model and data, but never load the model
    let (hits, model) = if query.trim().is_empty() {
        let model = session::configured_model(settings)?;
        session::load_corpus(settings)?;
        (Vec::new(), model.name().to_string())
    } else {
        let session = open(settings, exclude_domains, false, format)?;
        let hits = session.search.search(query, options)?;
        (hits, session.search.model_name().to_string())
    };
    let code = ExitCode::from_hits(&hits);

    if format.is_json() {
        let meta = ResponseMeta::now()
            .with_model(&model)
            .with_elapsed(start.elapsed());
        let output = SearchOutput {
            query,
            model: &model,
            cutoff: options.cutoff,
            hits,
        };
        let response = if code.is_success() {
            JsonResponse::success(output)
        } else {
            JsonResponse::empty(
                output,
                &format!("No labels scored above {}", options.cutoff),
            )
        };
        print_json(&response.with_meta(meta))?;
        return Ok(code);
    }

    if hits.is_empty() {
        println!(
            "{}",
            THEME.warning_with_icon(&format!("No labels scored above {}", options.cutoff))
        );
        return Ok(code);
    }

    println!("{}", display::create_results_table(&hits));
    println!(
        "{}",
        THEME.apply(
            &THEME.dim,
            format!(
                "{} results ({model}, cutoff {}) in {:.0?}",
                hits.len(),
                options.cutoff,
                start.elapsed()
            )
        )
    );
    Ok(code)
}

fn run_domains(settings: &Settings, format: OutputFormat) -> SearchResult<ExitCode> {
    let corpus = session::load_corpus(settings)?;

    let mut counts: Vec<DomainCount> = corpus
        .domains()
        .into_iter()
        .map(|domain| DomainCount {
            domain: domain.to_string(),
            labels: corpus.rows().iter().filter(|r| r.domain == domain).count(),
        })
        .collect();
    let untagged = corpus.rows().iter().filter(|r| r.domain.is_empty()).count();
    if untagged > 0 {
        counts.push(DomainCount {
            domain: String::new(),
            labels: untagged,
        });
    }

    let code = ExitCode::from_hits(&counts);
    if format.is_json() {
        print_json(&JsonResponse::success(counts).with_meta(ResponseMeta::now()))?;
        return Ok(code);
    }

    let rows: Vec<(String, usize)> = counts.into_iter().map(|c| (c.domain, c.labels)).collect();
    println!("{}", display::create_domains_table(&rows));
    Ok(code)
}
