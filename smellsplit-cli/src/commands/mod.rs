pub mod build;
pub mod init;
pub mod labels;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use smellsplit_core::config::SplitConfig;
use smellsplit_core::store::sqlite::SqliteLabelStore;

/// Config file picked up from the current directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "smellsplit.toml";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dataset for one page of candidate repositories
    Build(build::BuildArgs),
    /// Show the labels stored for one repository and smell
    Labels(labels::LabelsArgs),
    /// Count the units in each smell's positive and negative buckets
    Stats(stats::StatsArgs),
    /// Write a default configuration file
    Init(init::InitArgs),
}

pub async fn run(cmd: Command, quiet: bool) -> anyhow::Result<()> {
    match cmd {
        Command::Build(args) => build::run(args, quiet).await,
        Command::Labels(args) => labels::run(args).await,
        Command::Stats(args) => stats::run(&args),
        Command::Init(args) => init::run(&args),
    }
}

/// Load `path`, or `smellsplit.toml` if present, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SplitConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG);
            if !local.exists() {
                return Ok(SplitConfig::default());
            }
            local
        }
    };
    SplitConfig::load(&path).with_context(|| format!("Cannot load config: {}", path.display()))
}

pub fn open_store(path: &Path) -> anyhow::Result<SqliteLabelStore> {
    SqliteLabelStore::open(path)
        .with_context(|| format!("Cannot open label database: {}", path.display()))
}
