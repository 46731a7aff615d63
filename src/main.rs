//! Sentiment Compare - run text through several sentiment providers and compare the answers.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sentiment_compare::app::Analyzer;
use sentiment_compare::config::{CredentialSource, Settings};
use sentiment_compare::input::{InputSource, ResolvedInput};
use sentiment_compare::provider::ProviderId;
use sentiment_compare::server;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_INPUT: &str = "berita.html";

#[derive(Parser)]
#[command(name = "sentiment-compare")]
#[command(about = "Sentiment analysis across several inference providers")]
#[command(version)]
struct Cli {
    /// JSON settings file (endpoints, prompts, timeouts)
    #[arg(long, env = "SENTIMENT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one input with a single provider
    Analyze {
        /// File path (.html, .txt, .jpg, .png, .pdf) or http(s) URL
        #[arg(default_value = DEFAULT_INPUT)]
        input: String,

        /// generative, chat or classifier
        #[arg(long, short, default_value = "generative")]
        provider: ProviderId,

        /// Include the raw provider response
        #[arg(long)]
        raw: bool,
    },
    /// Analyze one input with every provider and print a side-by-side report
    Compare {
        /// File path (.html, .txt, .jpg, .png, .pdf) or http(s) URL
        #[arg(default_value = DEFAULT_INPUT)]
        input: String,

        /// Comma-separated subset, in report order
        #[arg(long, value_delimiter = ',')]
        providers: Vec<ProviderId>,
    },
    /// Serve /analyze and /compare over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_compare=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let credentials = CredentialSource::from_env();
    credentials.warn_missing();

    let analyzer = Analyzer::from_settings(&settings, credentials)
        .context("Failed to initialise HTTP clients")?;

    match cli.command {
        Commands::Analyze {
            input,
            provider,
            raw,
        } => {
            let Some(resolved) = resolve_or_report(&analyzer, &input).await else {
                return Ok(ExitCode::FAILURE);
            };
            info!("Analyzing {} with {}", resolved.source, provider);
            let analysis = analyzer.analyze(&resolved, provider, raw).await;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Compare { input, providers } => {
            let providers = if providers.is_empty() {
                ProviderId::ALL.to_vec()
            } else {
                providers
            };
            let Some(resolved) = resolve_or_report(&analyzer, &input).await else {
                return Ok(ExitCode::FAILURE);
            };
            let comparison = analyzer.compare(&resolved, &providers).await;
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        Commands::Serve { bind } => {
            server::serve(analyzer, &bind).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Resolve the CLI input, printing a readable diagnostic on failure.
async fn resolve_or_report(analyzer: &Analyzer, arg: &str) -> Option<ResolvedInput> {
    let result = match InputSource::parse(arg) {
        Ok(source) => {
            info!("Processing {}", source.describe());
            analyzer.resolve(&source).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(resolved) => {
            info!("Extracted {} chars from {}", resolved.text.chars().count(), resolved.source);
            Some(resolved)
        }
        Err(e) => {
            error!("Input resolution failed: {}", e);
            eprintln!("ERROR: {}: {}", e.kind(), e);
            None
        }
    }
}
