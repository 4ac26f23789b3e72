use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use smellsplit_core::config::SplitConfig;
use smellsplit_core::dataset::{run_directories, scan_dataset};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Config file (default: ./smellsplit.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dataset directory of a single run, overriding `workspace.root`
    #[arg(long, env = "SMELLSPLIT_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

pub fn run(args: &StatsArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;

    // With `timestamped`, every build writes into `root/<unix-ts>`.
    let datasets = match &args.workspace {
        Some(root) => vec![root.clone()],
        None if config.workspace.timestamped => {
            let root = &config.workspace.root;
            let runs = run_directories(root)
                .with_context(|| format!("Cannot read dataset: {}", root.display()))?;
            if runs.is_empty() {
                println!("No runs under {}", root.display());
            }
            runs
        }
        None => vec![config.workspace.root.clone()],
    };

    for (i, root) in datasets.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_dataset(root, &config)?;
    }
    Ok(())
}

fn print_dataset(root: &Path, config: &SplitConfig) -> anyhow::Result<()> {
    let summary = scan_dataset(root, config)
        .with_context(|| format!("Cannot read dataset: {}", root.display()))?;

    println!("Dataset at {}", root.display());
    println!();
    println!("  {:<28} {:>9} {:>9}", "smell", "positive", "negative");
    for smell in &config.smells {
        let counts = summary.smells.get(&smell.name).copied().unwrap_or_default();
        println!(
            "  {:<28} {:>9} {:>9}",
            smell.name, counts.positive, counts.negative
        );
    }

    if !summary.unrecognized.is_empty() {
        println!();
        println!("  Unrecognized directories:");
        for name in &summary.unrecognized {
            println!("    - {name}");
        }
    }
    Ok(())
}
