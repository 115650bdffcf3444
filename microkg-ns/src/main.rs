//! microkg-ns - Node synonymization for micro knowledge graphs
//!
//! Resolves the nodes of a tabular extraction to canonical identifiers via the
//! node synonymizer database, writes triage files for the failures, and
//! retries them after identifier/name normalization and gene augmentation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use microkg_common::config::{load_toml_config, AugmentationConfig};
use microkg_common::logging::init_tracing;
use microkg_ns::config::{resolve_augmentation, ConfigOverrides, RunConfig};
use microkg_ns::services::{EutilsClient, GeneDescriptionSource, SqliteSynonymizer};
use microkg_ns::workflow::{self, Pipeline};
use tracing::info;

/// Command-line arguments for microkg-ns
#[derive(Parser, Debug)]
#[command(name = "microkg-ns")]
#[command(about = "Node synonymization for micro knowledge graphs")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Node synonymizer SQLite database
    #[arg(long, global = true, env = "MICROKG_SYN_DB")]
    syn_db: Option<PathBuf>,

    /// Skip gene description augmentation
    #[arg(long, global = true)]
    no_augment: bool,

    /// esummary endpoint override
    #[arg(long, global = true, env = "MICROKG_AUGMENT_URL")]
    augment_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every node of a table, optionally retrying the failures
    Resolve {
        /// Input nodes table (TSV or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Annotated output table (TSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for triage files and the performance summary
        #[arg(long)]
        stat_dir: PathBuf,

        /// Run the normalize/augment/resolve retry on the failures
        #[arg(long)]
        retry: bool,
    },

    /// Normalize and augment a failed-records file
    Prepare {
        /// Failed records (e.g. failed_both.csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Prepared table (TSV)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Resolve a failed or prepared file a second time
    Retry {
        /// Failed or prepared records
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn describer(config: &AugmentationConfig) -> Result<Option<EutilsClient>> {
    if !config.enabled {
        return Ok(None);
    }
    let client = EutilsClient::new(config).context("Failed to build esummary client")?;
    info!(url = %config.base_url, min_interval_ms = config.min_interval_ms, "Gene augmentation enabled");
    Ok(Some(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&toml_config.logging).context("Failed to initialize logging")?;

    info!("Starting microkg-ns");
    info!(
        version = env!("CARGO_PKG_VERSION"),
        build = microkg_ns::BUILD_INFO,
        "Build identification"
    );

    let overrides = ConfigOverrides {
        synonym_db: args.syn_db,
        no_augment: args.no_augment,
        augment_url: args.augment_url,
    };

    if let Command::Prepare { input, output } = &args.command {
        let augmentation = resolve_augmentation(&overrides, toml_config.augmentation);
        let client = describer(&augmentation)?;
        let source = client.as_ref().map(|c| c as &dyn GeneDescriptionSource);

        workflow::run_prepare(input, output, source)
            .await
            .with_context(|| format!("Failed to prepare {}", input.display()))?;
        return Ok(());
    }

    let config = RunConfig::resolve(overrides, toml_config)?;

    let synonymizer = SqliteSynonymizer::open(&config.synonym_db)
        .await
        .with_context(|| format!("Failed to open synonym database {}", config.synonym_db.display()))?;
    info!("Synonym database connection established");

    let client = describer(&config.augmentation)?;
    let source = client.as_ref().map(|c| c as &dyn GeneDescriptionSource);
    let pipeline = Pipeline::new(&synonymizer, source);

    let result = match &args.command {
        Command::Resolve {
            input,
            output,
            stat_dir,
            retry,
        } => pipeline
            .run_resolve(input, output, stat_dir, *retry)
            .await
            .map(|run| {
                info!(
                    run_id = %run.run_id,
                    resolved = run.first.report.resolved(),
                    retry_resolved = run.retry.as_ref().map(|r| r.report.resolved()).unwrap_or(0),
                    "Run finished"
                );
            })
            .with_context(|| format!("Failed to resolve {}", input.display())),
        Command::Retry { input, output } => pipeline
            .run_retry(input, output)
            .await
            .map(|(_, outcome)| {
                info!(resolved = outcome.report.resolved(), "Retry finished");
            })
            .with_context(|| format!("Failed to retry {}", input.display())),
        Command::Prepare { .. } => Ok(()),
    };

    synonymizer.close().await;
    result
}
