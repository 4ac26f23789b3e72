use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use smellsplit_core::checkout::GitCheckout;
use smellsplit_core::decompose::ExternalDecomposer;
use smellsplit_core::pipeline::DatasetPipeline;
use smellsplit_core::progress::{IndicatifReporter, ProgressReporter};
use smellsplit_core::repository::WorkspaceLayout;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Index of the first candidate repository to process
    pub offset: u64,

    /// Number of candidate repositories to process
    pub limit: u64,

    /// Config file (default: ./smellsplit.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dataset root, overriding `workspace.root`
    #[arg(long, env = "SMELLSPLIT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Label database, overriding `store.path`
    #[arg(long, env = "SMELLSPLIT_DB")]
    pub db: Option<PathBuf>,
}

pub async fn run(args: BuildArgs, quiet: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(root) = args.workspace {
        config.workspace.root = root;
    }
    if let Some(db) = args.db {
        config.store.path = db;
    }
    config.validate().context("Invalid config")?;

    let store = super::open_store(&config.store.path)?;
    let decomposer = ExternalDecomposer::new(config.decomposer.command.clone());
    let layout = WorkspaceLayout::from_config(&config.workspace);
    info!(db = %config.store.path.display(), "Opened label database");

    let progress: Box<dyn ProgressReporter> = if quiet {
        Box::new(IndicatifReporter::hidden())
    } else {
        Box::new(IndicatifReporter::new())
    };
    let pipeline = DatasetPipeline::new(&config, layout, &store, &GitCheckout, &decomposer);
    let result = pipeline
        .run_with_progress(args.offset, args.limit, progress.as_ref())
        .await
        .context("Batch run failed")?;

    println!("Dataset written to {}", pipeline.layout().root.display());
    println!();
    println!("  Repositories:  {}", result.attempted);
    println!("  Succeeded:     {}", result.succeeded.len());
    println!("  Skipped:       {}", result.failures.len());
    println!("  Duration:      {:.2?}", result.duration);

    if !result.smells.is_empty() {
        println!();
        println!("  {:<28} {:>9} {:>9}", "smell", "positive", "negative");
        for (smell, stats) in &result.smells {
            println!(
                "  {smell:<28} {:>9} {:>9}",
                stats.positive, stats.negative
            );
        }
    }

    if !result.failures.is_empty() {
        println!();
        println!("  Skipped repositories ({}):", result.failures.len());
        for failure in &result.failures {
            println!("    - {failure}");
        }
    }

    Ok(())
}
