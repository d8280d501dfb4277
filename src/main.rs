use anyhow::Result;
use citation_fallback::config::{find_config_file, load_config, Config};
use citation_fallback::sources::{ArxivSource, ScholarSource};
use citation_fallback::{FallbackOptions, FallbackSearch, Lookup, Source};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Title used by the `demo` command
const DEMO_TITLE: &str = "Attention Is All You Need";

/// Citation Fallback - Find BibTeX for a paper title via arXiv and Google Scholar
#[derive(Parser, Debug)]
#[command(name = "citation-fallback")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find BibTeX for a paper title via arXiv and Google Scholar", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress progress output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum title similarity (0.0 - 1.0) for a result to be accepted
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Pause before querying Google Scholar, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a title on arXiv, falling back to Google Scholar
    #[command(alias = "l")]
    Lookup {
        /// Paper title
        title: String,

        /// Skip arXiv
        #[arg(long)]
        no_arxiv: bool,

        /// Skip Google Scholar
        #[arg(long)]
        no_scholar: bool,
    },

    /// Search arXiv only
    Arxiv {
        /// Paper title
        title: String,

        /// Number of results to request (only the first is considered)
        #[arg(long, short, default_value_t = 1)]
        max_results: usize,
    },

    /// Search Google Scholar only
    Scholar {
        /// Paper title
        title: String,
    },

    /// Search a well-known title on both services
    Demo,

    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("citation_fallback={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };

    if let Some(path) = &path {
        tracing::debug!("Using config file: {}", path.display());
    }

    let mut config = load_config(path.as_deref())?;

    if let Some(threshold) = cli.threshold {
        config.similarity.threshold = threshold;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.scholar.delay_ms = delay_ms;
    }

    config.validate()?;
    Ok(config)
}

fn report_missing(message: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}", message.yellow());
    } else {
        eprintln!("{}", message);
    }
}

/// Print the outcome of a single-source search, returning whether a record was found
async fn run_single(source: &dyn Source, title: &str) -> bool {
    match source.search_title(title).await {
        Ok(Lookup::Found(record)) => {
            print!("{}", record.to_bibtex());
            true
        }
        Ok(Lookup::Miss(reason)) => {
            report_missing(&format!("{}: no match ({})", source.name(), reason));
            false
        }
        Err(e) => {
            report_missing(&format!("{}: search failed ({})", source.name(), e));
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = resolve_config(&cli)?;

    let found = match &cli.command {
        Commands::Lookup {
            title,
            no_arxiv,
            no_scholar,
        } => {
            let options = FallbackOptions::from_config(&config)
                .arxiv(config.arxiv.enabled && !no_arxiv)
                .scholar(!no_scholar);

            match FallbackSearch::from_config(&config)?.search(title, options).await {
                Some(bibtex) => {
                    print!("{}", bibtex);
                    true
                }
                None => {
                    report_missing(&format!("No citation found for \"{}\"", title));
                    false
                }
            }
        }
        Commands::Arxiv { title, max_results } => {
            let source = ArxivSource::from_config(&config)?.max_results(*max_results);
            run_single(&source, title).await
        }
        Commands::Scholar { title } => {
            let source = ScholarSource::from_config(&config)?;
            run_single(&source, title).await
        }
        Commands::Demo => {
            println!("Searching: {}", DEMO_TITLE);

            println!("\n=== arXiv ===");
            let arxiv = run_single(&ArxivSource::from_config(&config)?, DEMO_TITLE).await;

            println!("\n=== Google Scholar ===");
            let scholar = run_single(&ScholarSource::from_config(&config)?, DEMO_TITLE).await;

            arxiv || scholar
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            true
        }
    };

    Ok(if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
