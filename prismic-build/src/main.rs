//! prismic-build - Build context entry point
//!
//! Compiles the schema set, fetches and normalizes every document, and writes
//! the schema SDL, the type-path index and the node output.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prismic_build::source_nodes;
use prismic_common::config::{LoggingConfig, SourceOptions};

/// Command-line arguments for prismic-build
#[derive(Parser, Debug)]
#[command(name = "prismic-build")]
#[command(about = "Compile content schemas and source normalized content nodes")]
#[command(version)]
struct Args {
    /// Options file (TOML)
    #[arg(short, long, env = "PRISMIC_CONFIG")]
    config: Option<PathBuf>,

    /// Repository name, overriding the options file
    #[arg(short, long, env = "PRISMIC_REPOSITORY_NAME")]
    repository_name: Option<String>,

    /// Content API access token
    #[arg(long, env = "PRISMIC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Directory of `<contentTypeId>.json` schema files
    #[arg(short, long)]
    schemas_dir: Option<PathBuf>,

    /// Directory receiving the build artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Language filter
    #[arg(long)]
    lang: Option<String>,

    /// Maximum documents normalized at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip image downloads
    #[arg(long)]
    no_images: bool,
}

impl Args {
    fn apply(self, options: &mut SourceOptions) {
        if let Some(name) = self.repository_name {
            options.repository_name = name;
        }
        if let Some(token) = self.access_token {
            options.access_token = Some(token);
        }
        if let Some(dir) = self.schemas_dir {
            options.schemas_dir = Some(dir);
        }
        if let Some(dir) = self.output_dir {
            options.output_dir = dir;
        }
        if let Some(lang) = self.lang {
            options.lang = lang;
        }
        if let Some(concurrency) = self.concurrency {
            options.concurrent_file_requests = concurrency;
        }
        if self.no_images {
            options.normalize_images = false;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Without an explicit file, flags and environment alone may configure a run
    let explicit_config = args.config.is_some();
    let (mut options, load_error) = match SourceOptions::load(args.config.as_deref()) {
        Ok(options) => (options, None),
        Err(e) if !explicit_config => {
            let mut options = SourceOptions::default();
            options.apply_env();
            (options, Some(e))
        }
        Err(e) => return Err(e).context("Failed to load options"),
    };
    args.apply(&mut options);

    init_tracing(&options.logging)?;
    if let Some(e) = load_error {
        warn!("{}; using command-line options", e);
    }

    info!(
        repository = %options.repository_name,
        output_dir = %options.output_dir.display(),
        "Starting prismic-build"
    );

    let summary = source_nodes(&options).await.context("Build failed")?;

    info!(
        documents = summary.documents,
        failed = summary.failed,
        nodes = summary.nodes,
        "Sourced nodes"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
