use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiscope::api::{ApiServer, ApiServerConfig};
use sentiscope::{HttpFetcher, LexiconEngine};
use sentiscope_core::analysis::truncate_chars;
use sentiscope_core::{AnalysisResult, CacheConfig, Fetcher, InferenceEngine, OrchestratorConfig};

/// Characters of fetched text shown by `analyze`
const PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "sentiscope")]
#[command(about = "Article sentiment analysis with a time-bounded result cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start API server
    Serve {
        /// Host to bind to
        #[arg(long, env = "SENTISCOPE_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "SENTISCOPE_PORT", default_value = "8000")]
        port: u16,

        /// Seconds a result stays cached; zero or negative disables caching
        #[arg(long, env = "SENTISCOPE_TTL_SECS", default_value = "3600", allow_negative_numbers = true)]
        ttl_secs: i64,

        /// Upper bound on a single article download
        #[arg(long, default_value = "10")]
        fetch_timeout_secs: u64,

        /// Characters of article text handed to the model
        #[arg(long, default_value = "512")]
        max_input_chars: usize,

        /// JSON lexicon file (built-in lexicon when omitted)
        #[arg(long, env = "SENTISCOPE_LEXICON")]
        lexicon: Option<PathBuf>,

        /// Purge expired entries on this interval
        #[arg(long)]
        sweep_interval_secs: Option<u64>,
    },

    /// Analyze a single URL and print the result
    Analyze {
        /// Article URL
        url: String,

        /// JSON lexicon file (built-in lexicon when omitted)
        #[arg(long, env = "SENTISCOPE_LEXICON")]
        lexicon: Option<PathBuf>,

        /// Upper bound on the download
        #[arg(long, default_value = "10")]
        fetch_timeout_secs: u64,

        /// Characters of article text handed to the model
        #[arg(long, default_value = "512")]
        max_input_chars: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "sentiscope=info,sentiscope_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            ttl_secs,
            fetch_timeout_secs,
            max_input_chars,
            lexicon,
            sweep_interval_secs,
        } => {
            let mut cache = CacheConfig::builder().ttl_secs(ttl_secs);
            if let Some(interval) = sweep_interval_secs {
                cache = cache.sweep_every(Duration::from_secs(interval));
            }

            let config = ApiServerConfig {
                host,
                port,
                cache: cache.build(),
                orchestrator: OrchestratorConfig::default()
                    .with_fetch_timeout(Duration::from_secs(fetch_timeout_secs))
                    .with_max_input_chars(max_input_chars),
                lexicon,
            };

            if !config.cache.caching_enabled() {
                println!("Caching disabled (TTL {}s)", ttl_secs);
            }
            println!("Starting Sentiscope API server on {}:{}", config.host, config.port);

            ApiServer::new(config).start().await?;
        }

        Commands::Analyze {
            url,
            lexicon,
            fetch_timeout_secs,
            max_input_chars,
        } => {
            analyze_once(
                &url,
                lexicon,
                Duration::from_secs(fetch_timeout_secs),
                max_input_chars,
            )
            .await?;
        }
    }

    Ok(())
}

async fn analyze_once(
    url: &str,
    lexicon: Option<PathBuf>,
    timeout: Duration,
    max_input_chars: usize,
) -> Result<()> {
    let engine = LexiconEngine::load_or_builtin(lexicon.as_deref())?;
    let fetcher = HttpFetcher::new();

    let text = fetcher
        .fetch(url, timeout)
        .await
        .with_context(|| format!("Failed to extract text from {}", url))?;

    println!("Extracted {} characters", text.chars().count());
    println!("\nPreview ({} first characters):", PREVIEW_CHARS);
    println!("{}...", truncate_chars(&text, PREVIEW_CHARS));

    let prediction = engine.classify(truncate_chars(&text, max_input_chars))?;
    let result = AnalysisResult::from_prediction(prediction)?;

    println!("\nSentiment: {} ({:.3})", result.label, result.score);
    Ok(())
}
